use std::sync::LazyLock;

use regex::Regex;

/// 登录前访问的页面，回调完成后跳回
pub const REDIRECT_COOKIE: &str = "redirect_after_login";

static SAFE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/[A-Za-z0-9\-._~!$&'()*+,;=:@%/?#]*$").expect("redirect path regex")
});

/// 按名称读取 Cookie 头中的值
pub fn cookie_value(header: Option<&str>, name: &str) -> Option<String> {
    header?
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// 是否携带以指定前缀命名的非空会话 Cookie
///
/// 只用于决定页面跳转，不作为鉴权依据。
pub fn has_session_cookie(header: Option<&str>, prefix: &str) -> bool {
    session_id(header, prefix).is_some()
}

/// 取第一个以指定前缀命名的非空会话 Cookie 的值
pub fn session_id(header: Option<&str>, prefix: &str) -> Option<String> {
    header?
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| key.starts_with(prefix) && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// 只接受站内相对路径，其余一律回到首页
pub fn safe_redirect_target(raw: Option<&str>) -> String {
    match raw {
        Some(path)
            if SAFE_PATH.is_match(path) && !path.starts_with("//") && !path.contains("/\\") =>
        {
            path.to_string()
        }
        Some(path) => {
            log::warn!("ignoring unsafe redirect target: {path}");
            "/".to_string()
        }
        None => "/".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "linux_do_credit_session_id";

    #[test]
    fn test_has_session_cookie() {
        assert!(has_session_cookie(
            Some("theme=dark; linux_do_credit_session_id=abc"),
            PREFIX
        ));
        assert!(has_session_cookie(
            Some("linux_do_credit_session_id_v2=abc"),
            PREFIX
        ));
        assert!(!has_session_cookie(Some("linux_do_credit_session_id="), PREFIX));
        assert!(!has_session_cookie(Some("other=1"), PREFIX));
        assert!(!has_session_cookie(None, PREFIX));
    }

    #[test]
    fn test_session_id_skips_empty_values() {
        let header = Some("linux_do_credit_session_id=; linux_do_credit_session_id_v2=xyz");
        assert_eq!(session_id(header, PREFIX).as_deref(), Some("xyz"));
        assert_eq!(session_id(Some("theme=dark"), PREFIX), None);
    }

    #[test]
    fn test_cookie_value() {
        let header = Some("a=1; redirect_after_login=/balance; b=2");
        assert_eq!(cookie_value(header, REDIRECT_COOKIE).as_deref(), Some("/balance"));
        assert_eq!(cookie_value(header, "missing"), None);
    }

    #[test]
    fn test_safe_redirect_target() {
        assert_eq!(safe_redirect_target(Some("/balance?tab=1")), "/balance?tab=1");
        assert_eq!(safe_redirect_target(Some("//evil.example")), "/");
        assert_eq!(safe_redirect_target(Some("https://evil.example")), "/");
        assert_eq!(safe_redirect_target(Some("/\\evil.example")), "/");
        assert_eq!(safe_redirect_target(Some("javascript:alert(1)")), "/");
        assert_eq!(safe_redirect_target(None), "/");
    }
}
