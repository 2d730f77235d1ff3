use std::future::Future;

use crate::error::AppResult;
use crate::external::CreditApi;
use crate::models::*;

pub trait MerchantSource {
    fn create_payment_link(
        &self,
        api_key_id: u64,
        req: &CreatePaymentLinkRequest,
    ) -> impl Future<Output = AppResult<PaymentLink>>;
}

impl MerchantSource for CreditApi {
    async fn create_payment_link(
        &self,
        api_key_id: u64,
        req: &CreatePaymentLinkRequest,
    ) -> AppResult<PaymentLink> {
        CreditApi::create_payment_link(self, api_key_id, req).await
    }
}

pub struct MerchantService<S> {
    source: S,
}

impl<S: MerchantSource> MerchantService<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// 校验通过后才调用上游创建支付链接
    pub async fn create_payment_link(
        &self,
        api_key_id: u64,
        req: &CreatePaymentLinkRequest,
    ) -> AppResult<PaymentLink> {
        let amount = req.validate()?;
        let normalized = CreatePaymentLinkRequest {
            product_name: req.product_name.trim().to_string(),
            amount: amount.as_str().to_string(),
            remark: req
                .remark
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
        };
        let link = self.source.create_payment_link(api_key_id, &normalized).await?;
        log::info!("payment link {} created for api key {api_key_id}", link.id);
        Ok(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockMerchant {
        sent: Mutex<Vec<CreatePaymentLinkRequest>>,
    }

    impl MerchantSource for MockMerchant {
        async fn create_payment_link(
            &self,
            _api_key_id: u64,
            req: &CreatePaymentLinkRequest,
        ) -> AppResult<PaymentLink> {
            self.sent.lock().unwrap().push(req.clone());
            Ok(PaymentLink {
                id: 1,
                token: "tok".into(),
                product_name: req.product_name.clone(),
                amount: Amount::parse(&req.amount)?,
                remark: req.remark.clone(),
                created_at: chrono::Utc::now(),
            })
        }
    }

    #[tokio::test]
    async fn test_incomplete_request_is_not_sent() {
        let service = MerchantService::new(MockMerchant::default());
        let req = CreatePaymentLinkRequest {
            product_name: "  ".into(),
            amount: "10".into(),
            remark: None,
        };
        let err = service.create_payment_link(1, &req).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(ref m) if m == "请填写完整信息"));
        assert!(service.source.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_request_is_normalized() {
        let service = MerchantService::new(MockMerchant::default());
        let req = CreatePaymentLinkRequest {
            product_name: " 会员 ".into(),
            amount: "9.90".into(),
            remark: Some("   ".into()),
        };
        let link = service.create_payment_link(1, &req).await.unwrap();
        assert_eq!(link.product_name, "会员");
        assert_eq!(link.pay_url("https://credit.example/"), "https://credit.example/paying/online?token=tok");

        let sent = service.source.sent.lock().unwrap();
        assert_eq!(sent[0].remark, None);
        assert_eq!(sent[0].amount, "9.90");
    }
}
