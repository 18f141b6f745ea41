use clap::Args;

use crate::output::OutputFormat;

/// Shared clap argument for commands that accept an output format.
#[derive(Args, Clone, Debug, Default, PartialEq, Eq)]
pub struct FormatArg {
    /// Output format
    #[arg(short = 'f', long = "format", value_enum, env = "DOCCRAWL_OUTPUT_FORMAT")]
    pub format: Option<OutputFormat>,
}

impl FormatArg {
    /// Effective output format; text unless requested otherwise.
    #[must_use]
    pub fn resolve(&self) -> OutputFormat {
        self.format.unwrap_or(OutputFormat::Text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_text() {
        assert_eq!(FormatArg::default().resolve(), OutputFormat::Text);
        let json = FormatArg {
            format: Some(OutputFormat::Json),
        };
        assert_eq!(json.resolve(), OutputFormat::Json);
    }
}
