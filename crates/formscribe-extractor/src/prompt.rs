//! LLM prompt construction for field extraction

use crate::flatten::FieldDescriptor;
use formscribe_domain::traits::ModelRequest;

/// Builds the model request for one extraction
pub struct PromptBuilder<'a> {
    descriptors: &'a [FieldDescriptor],
    conversation: &'a str,
    json_output: bool,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(descriptors: &'a [FieldDescriptor], conversation: &'a str) -> Self {
        Self {
            descriptors,
            conversation,
            json_output: true,
        }
    }

    /// Ask (or stop asking) for JSON-object output mode
    pub fn with_json_output(mut self, json_output: bool) -> Self {
        self.json_output = json_output;
        self
    }

    /// Build the complete request
    pub fn build(&self) -> ModelRequest {
        let mut user = String::new();

        user.push_str("Extract available information from this conversation:\n\n");
        user.push_str(EXTRACTION_RULES);
        user.push_str("\n\nFields to extract:\n");
        for descriptor in self.descriptors {
            user.push_str(&render_field(descriptor));
            user.push('\n');
        }

        user.push_str("\nConversation:\n");
        user.push_str(self.conversation);
        user.push_str("\n\n");

        user.push_str(OUTPUT_FORMAT);

        ModelRequest {
            system: SYSTEM_DIRECTIVE.to_string(),
            user,
            json_output: self.json_output,
        }
    }
}

/// One line of the field list
pub fn render_field(descriptor: &FieldDescriptor) -> String {
    let mut line = format!(
        "- {} (ID: {}, Type: {})",
        descriptor.label, descriptor.address, descriptor.field_type
    );
    if descriptor.required {
        line.push_str(" [required]");
    }
    line.push_str(" - expected: ");
    line.push_str(&descriptor.example);
    line
}

const SYSTEM_DIRECTIVE: &str = "You are a precise medical form data extraction assistant.
Extract only explicitly mentioned information.
Skip any fields where information is not found.
Return numeric values without units (e.g., '75' instead of '75 kg').
Only include confidence scores where you are highly confident (>0.8).";

const EXTRACTION_RULES: &str = "Extract information from the conversation following these rules:
1. Only include fields where information is explicitly mentioned
2. Skip fields where no relevant information is found
3. For each found field, provide:
   - value: The extracted information (numbers should be without units)
   - source_quote: The exact text from conversation
   - confidence: A number between 0.0 and 1.0";

const OUTPUT_FORMAT: &str = r#"Format the response as JSON:
{
    "fields": {
        "section.field_id": {
            "value": (extracted value),
            "source_quote": "exact quote",
            "confidence": 0.95
        }
    }
}"#;
