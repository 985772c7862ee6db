//! Slack Block Kit payload model.
//!
//! Only the block types the alert layouts use are modelled. Each variant
//! serializes to the JSON shape the incoming-webhook API expects, keyed by
//! a `"type"` tag.

use serde::{Deserialize, Serialize};

/// A text object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Text {
    PlainText {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        emoji: Option<bool>,
    },
    Mrkdwn {
        text: String,
    },
}

impl Text {
    /// Plain text with emoji shortcodes enabled.
    pub fn plain(text: impl Into<String>) -> Self {
        Text::PlainText {
            text: text.into(),
            emoji: Some(true),
        }
    }

    /// Plain text without the `emoji` flag, as used on button labels.
    pub fn label(text: impl Into<String>) -> Self {
        Text::PlainText {
            text: text.into(),
            emoji: None,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Text::Mrkdwn { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Text::PlainText { text, .. } | Text::Mrkdwn { text } => text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonStyle {
    Primary,
    Danger,
}

/// Interactive element inside an actions block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    Button {
        text: Text,
        url: String,
        action_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<ButtonStyle>,
    },
}

impl Element {
    /// A primary-styled link button.
    pub fn link_button(
        label: impl Into<String>,
        url: impl Into<String>,
        action_id: impl Into<String>,
    ) -> Self {
        Element::Button {
            text: Text::label(label),
            url: url.into(),
            action_id: action_id.into(),
            style: Some(ButtonStyle::Primary),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header {
        text: Text,
    },
    Divider,
    Section {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<Text>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        fields: Vec<Text>,
    },
    Actions {
        elements: Vec<Element>,
    },
}

/// Fluent builder for an ordered block list.
#[derive(Debug, Default)]
pub struct BlockBuilder {
    blocks: Vec<Block>,
}

impl BlockBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Header {
            text: Text::plain(text),
        });
        self
    }

    pub fn divider(mut self) -> Self {
        self.blocks.push(Block::Divider);
        self
    }

    /// Section with mrkdwn text.
    pub fn markdown(self, text: impl Into<String>) -> Self {
        self.section(Text::markdown(text))
    }

    /// Section with plain text.
    pub fn plain(self, text: impl Into<String>) -> Self {
        self.section(Text::plain(text))
    }

    pub fn section(mut self, text: Text) -> Self {
        self.blocks.push(Block::Section {
            text: Some(text),
            fields: Vec::new(),
        });
        self
    }

    pub fn fields(mut self, fields: Vec<Text>) -> Self {
        self.blocks.push(Block::Section { text: None, fields });
        self
    }

    /// Actions block. Skipped when `elements` is empty, since Slack rejects
    /// an actions block without elements.
    pub fn actions(mut self, elements: Vec<Element>) -> Self {
        if !elements.is_empty() {
            self.blocks.push(Block::Actions { elements });
        }
        self
    }

    pub fn build(self) -> Vec<Block> {
        self.blocks
    }
}
