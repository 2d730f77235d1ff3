/// 上传文件的访问地址
pub fn file_url(upload_id: Option<u64>) -> Option<String> {
    upload_id.map(|id| format!("/f/{id}"))
}

/// 校验后端返回的图片地址，只接受 `/f/` 开头的站内相对路径
pub fn sanitize_image_url(url: Option<&str>) -> Option<String> {
    let url = url?;
    if url.is_empty() {
        return None;
    }

    if !url.starts_with("/f/") {
        log::warn!("Invalid image URL detected: {url}");
        return None;
    }

    // 防止路径遍历
    if url.contains("..") || url.contains("//") {
        log::warn!("Path traversal detected in URL: {url}");
        return None;
    }

    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_url() {
        assert_eq!(file_url(Some(42)).as_deref(), Some("/f/42"));
        assert_eq!(file_url(None), None);
    }

    #[test]
    fn test_sanitize_image_url() {
        assert_eq!(sanitize_image_url(Some("/f/42")).as_deref(), Some("/f/42"));
        assert_eq!(sanitize_image_url(Some("https://evil.example/x.png")), None);
        assert_eq!(sanitize_image_url(Some("/f/../etc/passwd")), None);
        assert_eq!(sanitize_image_url(Some("/f//evil.example")), None);
        assert_eq!(sanitize_image_url(Some("javascript:alert(1)")), None);
        assert_eq!(sanitize_image_url(Some("")), None);
        assert_eq!(sanitize_image_url(None), None);
    }
}
