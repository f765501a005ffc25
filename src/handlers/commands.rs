use serenity::all::{ChannelType, CommandOptionType};
use serenity::builder::{CreateCommand, CreateCommandOption};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    String,
    Integer { min: u64, max: u64 },
    Channel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: OptionKind,
    pub required: bool,
    pub choices: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// Shown by `/help`.
    pub usage: &'static str,
    pub options: Vec<OptionSpec>,
}

impl OptionSpec {
    fn string(name: &'static str, description: &'static str, choices: &[&str]) -> Self {
        Self {
            name,
            description,
            kind: OptionKind::String,
            required: true,
            choices: choices.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn to_option(&self) -> CreateCommandOption {
        let kind = match self.kind {
            OptionKind::String => CommandOptionType::String,
            OptionKind::Integer { .. } => CommandOptionType::Integer,
            OptionKind::Channel => CommandOptionType::Channel,
        };
        let mut option =
            CreateCommandOption::new(kind, self.name, self.description).required(self.required);
        match self.kind {
            OptionKind::Integer { min, max } => {
                option = option.min_int_value(min).max_int_value(max);
            }
            OptionKind::Channel => {
                option = option.channel_types(vec![ChannelType::Text, ChannelType::News]);
            }
            OptionKind::String => {
                for choice in &self.choices {
                    option = option.add_string_choice(choice, choice);
                }
            }
        }
        option
    }
}

impl CommandSpec {
    pub fn to_command(&self) -> CreateCommand {
        self.options
            .iter()
            .fold(
                CreateCommand::new(self.name).description(self.description),
                |command, option| command.add_option(option.to_option()),
            )
    }
}

/// Builds the command list; `/set-org` choices come from the registered
/// organizations.
pub fn command_specs(orgs: &[String]) -> Vec<CommandSpec> {
    let org_choices: Vec<&str> = orgs.iter().map(String::as_str).collect();
    vec![
        CommandSpec {
            name: "set-org",
            description: "Choose the organization to follow",
            usage: "/set-org org:<org> — Pick your org. Required before enabling notifications.",
            options: vec![OptionSpec::string("org", "Organization", &org_choices)],
        },
        CommandSpec {
            name: "set-channel",
            description: "Pick the channel for notifications",
            usage: "/set-channel [channel:#channel] — Choose post channel.",
            options: vec![OptionSpec {
                name: "channel",
                description: "Channel to use (default: this channel)",
                kind: OptionKind::Channel,
                required: false,
                choices: Vec::new(),
            }],
        },
        CommandSpec {
            name: "notify",
            description: "Enable or disable fight-night posts for this server",
            usage: "/notify state:<on|off> — Toggle notifications (requires org set).",
            options: vec![OptionSpec::string("state", "Enable or disable notifications", &["on", "off"])],
        },
        CommandSpec {
            name: "set-tz",
            description: "Set the server's timezone (IANA name)",
            usage: "/set-tz tz:<Region/City> — Set timezone (IANA).",
            options: vec![OptionSpec::string("tz", "Timezone, e.g., America/Los_Angeles", &[])],
        },
        CommandSpec {
            name: "set-run-hour",
            description: "Set the local hour (0-23) for fight-night posts",
            usage: "/set-run-hour hour:<0-23> — Hour of day to post.",
            options: vec![OptionSpec {
                name: "hour",
                description: "Hour of day, 0-23",
                kind: OptionKind::Integer { min: 0, max: 23 },
                required: true,
                choices: Vec::new(),
            }],
        },
        CommandSpec {
            name: "reminders",
            description: "Create a server event the day before each card",
            usage: "/reminders state:<on|off> — Toggle day-before server events.",
            options: vec![OptionSpec::string("state", "Enable or disable reminders", &["on", "off"])],
        },
        CommandSpec {
            name: "ufc-contender",
            description: "Include or exclude Dana White's Contender Series",
            usage: "/ufc-contender state:<include|exclude> — Contender Series events.",
            options: vec![OptionSpec::string("state", "Include or exclude", &["include", "exclude"])],
        },
        CommandSpec {
            name: "status",
            description: "Show current bot settings for this server",
            usage: "/status — Show current settings.",
            options: Vec::new(),
        },
        CommandSpec {
            name: "next-event",
            description: "Show the next event for the selected org",
            usage: "/next-event — Show the next event for your org.",
            options: Vec::new(),
        },
        CommandSpec {
            name: "test-notify",
            description: "Post a preview notification to the configured channel",
            usage: "/test-notify — Post a preview now.",
            options: Vec::new(),
        },
        CommandSpec {
            name: "help",
            description: "Show available commands and usage",
            usage: "/help — This message.",
            options: Vec::new(),
        },
    ]
}

pub fn help_text(specs: &[CommandSpec]) -> String {
    let lines: Vec<String> = specs.iter().map(|spec| format!("- {}", spec.usage)).collect();
    format!("Commands:\n{}", lines.join("\n"))
}
