use serde::{Deserialize, Serialize};

/// Which strategy produced a successful resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionMethod {
    NoRedirectNeeded,
    RedirectResolved,
    DirectIdParse,
    ContentParsed,
    DesktopUaRetry,
    DeepLinkConverted,
    MobileToDesktopConverted,
}

/// Failure categories reported by the URL resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolveErrorKind {
    NoUrlFound,
    UnsupportedDomain,
    InvalidFinalUrl,
    Timeout,
    RequestError,
}

impl ResolveErrorKind {
    /// `true` for transient failures a caller may retry; terminal kinds must
    /// not be retried automatically.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, ResolveErrorKind::Timeout | ResolveErrorKind::RequestError)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveError {
    pub kind: ResolveErrorKind,
    pub message: String,
}

/// Outcome of one resolution call. Failures are data, never panics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    pub success: bool,
    pub original_input: String,
    pub final_url: Option<String>,
    pub redirect_count: u32,
    pub method: Option<ResolutionMethod>,
    /// `true` when the URL was pulled out of surrounding free text.
    pub extracted_from_text: bool,
    pub error: Option<ResolveError>,
}

impl ResolutionResult {
    #[must_use]
    pub fn resolved(
        original_input: &str,
        final_url: String,
        redirect_count: u32,
        method: ResolutionMethod,
        extracted_from_text: bool,
    ) -> Self {
        Self {
            success: true,
            original_input: original_input.to_owned(),
            final_url: Some(final_url),
            redirect_count,
            method: Some(method),
            extracted_from_text,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(
        original_input: &str,
        kind: ResolveErrorKind,
        message: impl Into<String>,
        extracted_from_text: bool,
    ) -> Self {
        Self {
            success: false,
            original_input: original_input.to_owned(),
            final_url: None,
            redirect_count: 0,
            method: None,
            extracted_from_text,
            error: Some(ResolveError {
                kind,
                message: message.into(),
            }),
        }
    }

    /// Records where a failed resolution ended up.
    #[must_use]
    pub fn with_landing(mut self, final_url: Option<String>, redirect_count: u32) -> Self {
        self.final_url = final_url;
        self.redirect_count = redirect_count;
        self
    }

    #[must_use]
    pub fn error_kind(&self) -> Option<ResolveErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_kinds() {
        assert!(ResolveErrorKind::Timeout.is_retryable());
        assert!(ResolveErrorKind::RequestError.is_retryable());
        assert!(!ResolveErrorKind::UnsupportedDomain.is_retryable());
        assert!(!ResolveErrorKind::NoUrlFound.is_retryable());
        assert!(!ResolveErrorKind::InvalidFinalUrl.is_retryable());
    }

    #[test]
    fn serializes_camel_case_fields() {
        let result = ResolutionResult::resolved(
            "https://item.taobao.com/item.htm?id=1",
            "https://item.taobao.com/item.htm?id=1".to_owned(),
            0,
            ResolutionMethod::NoRedirectNeeded,
            false,
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["redirectCount"], 0);
        assert_eq!(json["method"], "NoRedirectNeeded");
        assert_eq!(json["extractedFromText"], false);
        assert!(json["error"].is_null());
    }

    #[test]
    fn failed_result_carries_landing() {
        let result = ResolutionResult::failed(
            "https://e.tb.cn/h.x",
            ResolveErrorKind::InvalidFinalUrl,
            "landed elsewhere",
            false,
        )
        .with_landing(Some("https://www.taobao.com/".to_owned()), 2);
        assert!(!result.success);
        assert_eq!(result.redirect_count, 2);
        assert_eq!(result.error_kind(), Some(ResolveErrorKind::InvalidFinalUrl));
    }
}
