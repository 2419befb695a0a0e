#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Clear,
    Forget,
    Help,
    Quit,
    Reset,
    Status,
    Unknown(String),
}

impl SlashCommand {
    /// Returns None when the input is not a slash command at all.
    pub fn parse(text: &str) -> Option<SlashCommand> {
        let text = text.trim();
        if !text.starts_with('/') {
            return None;
        }

        let name = text.split_whitespace().next().unwrap_or(text);
        let command = match name {
            "/clear" => SlashCommand::Clear,
            "/forget" => SlashCommand::Forget,
            "/help" | "/h" => SlashCommand::Help,
            "/quit" | "/exit" | "/q" => SlashCommand::Quit,
            "/reset" => SlashCommand::Reset,
            "/status" => SlashCommand::Status,
            _ => SlashCommand::Unknown(name.to_string()),
        };

        return Some(command);
    }
}
