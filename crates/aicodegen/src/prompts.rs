//! System prompts that can be picked with `aicodegen use <name>`.

const DEFAULT_START_MESSAGE: &str =
    "Chat with Aidan to ask about the current repo (Ctrl+C to quit)";

pub struct Prompt {
    pub name: &'static str,
    template: &'static str,
    start_message: Option<&'static str>,
}

impl Prompt {
    /// The system prompt with host placeholders filled in.
    pub fn system_prompt(&self) -> String {
        self.template.trim().replace("{{HOST_OS}}", host_os())
    }

    pub fn start_message(&self) -> &'static str {
        self.start_message.unwrap_or(DEFAULT_START_MESSAGE)
    }
}

pub const PROMPTS: &[Prompt] = &[
    Prompt {
        name: "default",
        template: include_str!("./prompts/default.md"),
        start_message: None,
    },
    Prompt {
        name: "sample",
        template: include_str!("./prompts/sample.md"),
        start_message: Some(
            "Describe the integration you want to build (Ctrl+C to quit)",
        ),
    },
];

pub fn find(name: &str) -> Option<&'static Prompt> {
    PROMPTS.iter().find(|prompt| prompt.name == name)
}

pub fn names() -> String {
    PROMPTS
        .iter()
        .map(|prompt| prompt.name)
        .collect::<Vec<_>>()
        .join(", ")
}

#[inline]
fn host_os() -> &'static str {
    match std::env::consts::OS {
        "linux" => "Linux",
        "macos" => "macOS",
        "windows" => "Windows",
        _ => "some other OS",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find() {
        let prompt = find("default").unwrap();
        assert!(prompt.system_prompt().starts_with("You are a coding assistant"));
        assert!(!prompt.system_prompt().contains("{{HOST_OS}}"));
        assert_eq!(prompt.start_message(), DEFAULT_START_MESSAGE);

        assert!(find("sample").is_some());
        assert!(find("lsv3").is_none());
        assert_eq!(names(), "default, sample");
    }
}
