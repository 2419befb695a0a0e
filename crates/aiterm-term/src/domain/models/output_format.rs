use strum::IntoEnumIterator;
use strum_macros::Display;
use strum_macros::EnumIter;
use strum_macros::EnumString;
use strum_macros::EnumVariantNames;

/// How model replies are shown. `Raw` prints the text exactly as streamed,
/// without colors or trimming.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumVariantNames, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Markdown,
    Raw,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Option<OutputFormat> {
        return OutputFormat::iter().find(|e| return e.to_string() == s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_parses_format_names() {
        assert_eq!(OutputFormat::parse("markdown"), Some(OutputFormat::Markdown));
        assert_eq!(OutputFormat::parse("raw"), Some(OutputFormat::Raw));
        assert_eq!(OutputFormat::parse("html"), None);
        assert_eq!(OutputFormat::default().to_string(), "markdown");
    }
}
