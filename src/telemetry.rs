use log::{error, warn};

/// Destination for unexpected failures. Reporting is fire-and-forget and
/// must never fail the extraction.
pub trait ErrorReporter: Send + Sync {
    fn capture_warning(&self, message: &str, context: &[(&str, &str)]);
    fn capture_error(&self, message: &str, context: &[(&str, &str)]);
}

/// Reports through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn capture_warning(&self, message: &str, context: &[(&str, &str)]) {
        warn!("{} {}", message, format_context(context));
    }

    fn capture_error(&self, message: &str, context: &[(&str, &str)]) {
        error!("{} {}", message, format_context(context));
    }
}

fn format_context(context: &[(&str, &str)]) -> String {
    context
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_context() {
        assert_eq!(
            format_context(&[("url", "https://a"), ("step", "extract")]),
            "url=https://a step=extract"
        );
        assert_eq!(format_context(&[]), "");
    }
}
