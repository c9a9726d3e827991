//! Prompt assembly: tone profiles, safety rules, system prompts and the
//! conversational RAG template.
//!
//! Every assembled prompt embeds the data-integrity rules. Rendering is
//! deterministic for identical inputs, which the content-addressed
//! completion cache depends on.

use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

use crate::countries;
use crate::models::Confidence;
use crate::models::Tone;
use crate::MigRagError;
use crate::Result;

/// Template for generating prompts.
///
/// Variables use `{{name}}` syntax and are substituted textually. Rendering
/// fails if a referenced variable is missing from the supplied values, so an
/// unresolved placeholder can never reach the model.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    variables: Vec<String>,
}

impl PromptTemplate {
    /// Create a new prompt template
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let variables = extract_variables(&template);
        Self {
            template,
            variables,
        }
    }

    /// Fill in the template with variables; errors on the first missing one
    pub fn render(&self, values: &HashMap<String, String>) -> Result<String> {
        let mut result = self.template.clone();
        for var in &self.variables {
            let value = values.get(var).ok_or_else(|| {
                MigRagError::Template(format!("missing template variable: {var}"))
            })?;
            result = result.replace(&format!("{{{{{var}}}}}"), value);
        }
        Ok(result)
    }

    /// Get required variables
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }
}

/// Extract variable names from template
fn extract_variables(template: &str) -> Vec<String> {
    let mut variables = Vec::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '{' && chars.peek() == Some(&'{') {
            chars.next(); // skip second '{'
            let mut var_name = String::new();
            while let Some(&ch) = chars.peek() {
                if ch == '}' {
                    chars.next();
                    if chars.peek() == Some(&'}') {
                        chars.next();
                        break;
                    }
                } else {
                    var_name.push(ch);
                    chars.next();
                }
            }
            if !var_name.is_empty() && !variables.contains(&var_name) {
                variables.push(var_name);
            }
        }
    }

    variables
}

/// Personality intro line for a tone
pub fn tone_intro(tone: Tone) -> &'static str {
    match tone {
        Tone::Helpful => "Hi! I'm Japabot, your friendly migration guide.",
        Tone::UncleJapa => "Ah ah! Uncle Japa here o! My guy/my sister, how far?",
        Tone::Bestie => "Heyyyy bestie! Your japa bestie is here to spill all the tea!",
        Tone::StrictOfficer => "Good day. Immigration Officer speaking. Please pay attention.",
        Tone::HypeMan => "YOOOOO! LET'S GOOOO! YOUR HYPE MAN IS HERE!",
        Tone::Therapist => {
            "Hello, I'm here to support you through this journey. How are you feeling?"
        }
    }
}

/// Style instructions for a tone
pub fn tone_instructions(tone: Tone) -> &'static str {
    match tone {
        Tone::Helpful => {
            "Be professional but warm. Provide clear explanations. Be encouraging and supportive."
        }
        Tone::UncleJapa => {
            "Use Nigerian pidgin phrases naturally. Be like an uncle who's been abroad and knows \
             the struggles. Call them 'my guy' or 'my sister'. Use phrases like 'no be beans', \
             'e no easy', 'I go show you'. Be real and encouraging."
        }
        Tone::Bestie => {
            "Use Gen-Z slang naturally: 'bestie', 'ngl', 'lowkey', 'iconic', 'slay'. Use emojis \
             occasionally. Be excited and supportive. Keep it real but fun."
        }
        Tone::StrictOfficer => {
            "Be formal and bureaucratic. Use official language. Be detail-oriented and procedural."
        }
        Tone::HypeMan => {
            "USE CAPS FOR EMPHASIS! BE EXTREMELY ENTHUSIASTIC! HYPE THEM UP! CELEBRATE EVERY \
             STEP! MOTIVATION OVERLOAD!"
        }
        Tone::Therapist => {
            "Acknowledge their emotions. Use phrases like 'I hear you', 'It's normal to \
             feel...', 'Let's take this one step at a time'. Be gentle and validating."
        }
    }
}

/// Context type selecting a system-prompt variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", rename_all = "snake_case")]
pub enum ContextType {
    Base,
    Country,
    Visa,
    Cost,
    Roadmap,
}

impl Default for ContextType {
    fn default() -> Self {
        ContextType::Base
    }
}

impl From<String> for ContextType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "country" => ContextType::Country,
            "visa" => ContextType::Visa,
            "cost" => ContextType::Cost,
            "roadmap" => ContextType::Roadmap,
            _ => ContextType::Base,
        }
    }
}

/// Data-integrity rules embedded in every system prompt.
///
/// The tier-1 country list is generated from the country registry so the
/// prompt and the data stay in sync.
pub fn safety_rules() -> String {
    let tier1 = countries::tier1_names().join(", ");
    format!(
        r#"## CRITICAL DATA INTEGRITY RULES

You MUST follow these rules for EVERY response:

1. **NO FABRICATION**: If you don't have specific data for a country, visa, or cost, say "I don't have verified data for this" rather than inventing numbers or requirements.

2. **UNCERTAINTY LANGUAGE**: Use phrases like:
   - "Based on available data..."
   - "This may vary..."
   - "You should verify this with..."
   - "Approximately..." or "Around..."
   - "As of [date]..."

3. **SOURCE AWARENESS**:
   - Acknowledge when data may be outdated
   - Recommend official sources for critical decisions
   - Never present estimates as facts

4. **CRITICAL DISCLAIMERS** - Always include for:
   - Visa requirements: "Visa rules change frequently. Always verify with the official embassy or consulate."
   - Cost estimates: "Costs are estimates based on available data and will vary based on lifestyle and timing."
   - Legal matters: "This is general information, not legal advice. Consult an immigration lawyer for your specific situation."
   - Timelines: "Processing times are approximate and can vary significantly."

5. **TIER-1 PRIORITY**: Our verified data is strongest for: {tier1}, and select others. For other countries, be more cautious about specifics.

6. **RED FLAGS**: If a user asks about:
   - Specific visa approval chances -> "I cannot predict individual outcomes"
   - Guaranteed jobs or housing -> "I cannot guarantee outcomes"
   - Illegal immigration routes -> Refuse to answer
   - Circumventing requirements -> Refuse to answer"#
    )
}

/// Hedging guidance appended to country-focused prompts
pub fn confidence_guidance(confidence: Confidence) -> &'static str {
    match confidence {
        Confidence::High => {
            "This country has verified, recently-updated data. You can be more specific in your \
             responses, but still:\n\
             - Use uncertainty language for time-sensitive info\n\
             - Recommend official sources for visa details\n\
             - Present cost ranges rather than exact figures"
        }
        Confidence::Medium => {
            "This country has partial data that may need verification. You should:\n\
             - Use more hedging language (\"approximately\", \"around\", \"typically\")\n\
             - Strongly recommend verifying with official sources\n\
             - Acknowledge data may be incomplete or dated"
        }
        Confidence::Low => {
            "This country has limited or outdated data. You MUST:\n\
             - Use maximum uncertainty language\n\
             - Strongly caveat all specific figures\n\
             - Recommend the user research independently\n\
             - Focus on general guidance rather than specifics\n\
             - State clearly: \"Our data for this country is limited. Please verify all details \
             with official sources.\""
        }
    }
}

const SYSTEM_PROMPT_BASE: &str = r"You are Japabot, an AI migration assistant.

Your role is to help users explore migration options, understand visa requirements, estimate costs, and plan their journey. You are supportive, culturally aware (especially of Nigerian users planning to 'japa' or relocate abroad), and practical.

{{safety_rules}}

## RESPONSE STYLE
- Be warm but factual
- Acknowledge emotional aspects of migration decisions
- Provide actionable next steps when possible
- Keep responses focused and scannable";

const SYSTEM_PROMPT_COUNTRY: &str = r"You are Japabot, helping a user learn about {{country_name}} as a migration destination.

{{safety_rules}}

## COUNTRY-SPECIFIC GUIDANCE
- Focus on what makes this country unique for migrants
- Highlight both opportunities and challenges
- Be honest about difficulty and requirements
- Reference official resources when available

## DATA CONFIDENCE
Our data for {{country_name}} is marked as: {{data_confidence}}
{{confidence_guidance}}";

const SYSTEM_PROMPT_VISA: &str = r"You are Japabot, helping a user understand visa options for {{country_name}}.

{{safety_rules}}

## VISA GUIDANCE RULES
- NEVER guarantee visa approval
- Always recommend verifying with official embassy sources
- Clearly state when requirements may have changed
- Distinguish between general requirements and specific circumstances
- Acknowledge that immigration rules change frequently

## CRITICAL DISCLAIMER
Include this in responses about visa requirements:
'Visa requirements change frequently. This information is for guidance only. Always verify current requirements with the official embassy or immigration authority of {{country_name}}.'";

const SYSTEM_PROMPT_COST: &str = r"You are Japabot, helping a user estimate costs for relocating to {{country_name}}.

{{safety_rules}}

## COST ESTIMATION RULES
- Present all figures as ESTIMATES, never exact amounts
- Use ranges rather than single figures when possible
- Account for lifestyle variation (budget, mid-range, comfortable)
- Include hidden costs users often forget
- Recommend building a 20-30% buffer for unexpected expenses

## CRITICAL DISCLAIMER
Include this in cost-related responses:
'These are rough estimates based on available data. Actual costs vary significantly based on lifestyle, location within the country, timing, and personal circumstances. Use these figures for planning purposes only.'";

const SYSTEM_PROMPT_ROADMAP: &str = r"You are Japabot, helping a user plan their migration journey to {{country_name}}.

{{safety_rules}}

## ROADMAP GUIDANCE
- Break down the journey into clear, actionable phases
- Include realistic timeframes (with caveats about variation)
- Highlight dependencies between steps
- Suggest when to seek professional help (lawyers, agents)
- Account for potential delays and setbacks

## APPROACH
- Be encouraging but realistic
- Acknowledge that migration planning is stressful
- Celebrate progress while preparing users for challenges";

/// Build the system prompt for a context type.
///
/// Missing country name defaults to a generic phrase; missing confidence is
/// treated as low (most cautious tier).
pub fn system_prompt(
    context_type: ContextType,
    country_name: Option<&str>,
    data_confidence: Option<Confidence>,
) -> Result<String> {
    let template = PromptTemplate::new(match context_type {
        ContextType::Base => SYSTEM_PROMPT_BASE,
        ContextType::Country => SYSTEM_PROMPT_COUNTRY,
        ContextType::Visa => SYSTEM_PROMPT_VISA,
        ContextType::Cost => SYSTEM_PROMPT_COST,
        ContextType::Roadmap => SYSTEM_PROMPT_ROADMAP,
    });

    let confidence = data_confidence.unwrap_or(Confidence::Low);

    let mut values = HashMap::new();
    values.insert("safety_rules".to_string(), safety_rules());
    values.insert(
        "country_name".to_string(),
        country_name.unwrap_or("the destination country").to_string(),
    );
    values.insert(
        "data_confidence".to_string(),
        confidence.as_str().to_string(),
    );
    values.insert(
        "confidence_guidance".to_string(),
        confidence_guidance(confidence).to_string(),
    );

    template.render(&values)
}

const CHAT_TEMPLATE: &str = r"{{personality_intro}}

{{conversation_section}}{{focus_section}}{{documents_section}}User's current question: {{message}}

{{tone_instructions}}

{{closing_guidance}}

Response:";

/// Typed context for the conversational RAG template; every field the
/// template consumes is enumerated here
#[derive(Debug, Clone, Default)]
pub struct ChatPromptContext {
    pub tone: Tone,
    pub message: String,
    /// Rendered conversation lines; empty when there is no history
    pub conversation_context: String,
    /// Rendered document blocks; empty when retrieval found nothing
    pub document_context: String,
    pub focused_country: Option<String>,
}

/// Assemble the user-role prompt for a chat turn
pub fn build_chat_prompt(context: &ChatPromptContext) -> Result<String> {
    let conversation_section = if context.conversation_context.is_empty() {
        String::new()
    } else {
        format!(
            "Previous conversation context:\n{}\n\n---\n\n",
            context.conversation_context
        )
    };

    let focus_section = context.focused_country.as_ref().map_or_else(String::new, |country| {
        format!("The user is asking about: {country}\n\n")
    });

    let has_documents = !context.document_context.is_empty();
    let documents_section = if has_documents {
        format!(
            "I have access to the following official immigration information to help answer \
             your question:\n\n{}\n\n---\n\n",
            context.document_context
        )
    } else {
        String::new()
    };

    let closing_guidance = if has_documents {
        let focus = context
            .focused_country
            .as_deref()
            .unwrap_or("the countries mentioned");
        format!(
            "Based on the official information above and our conversation, provide a helpful \
             response. Be specific and focus on the country we've been discussing ({focus}). \
             If the documents don't fully answer the question, acknowledge what's known and \
             what requires further research."
        )
    } else {
        "Provide general guidance, but remind the user that for specific country information, \
         they should specify which country they're interested in. Be helpful but acknowledge \
         uncertainty without specific data."
            .to_string()
    };

    let mut values = HashMap::new();
    values.insert(
        "personality_intro".to_string(),
        tone_intro(context.tone).to_string(),
    );
    values.insert("conversation_section".to_string(), conversation_section);
    values.insert("focus_section".to_string(), focus_section);
    values.insert("documents_section".to_string(), documents_section);
    values.insert("message".to_string(), context.message.clone());
    values.insert(
        "tone_instructions".to_string(),
        tone_instructions(context.tone).to_string(),
    );
    values.insert("closing_guidance".to_string(), closing_guidance);

    PromptTemplate::new(CHAT_TEMPLATE).render(&values)
}

const COMPARISON_TEMPLATE: &str = r"You are comparing {{left_country}} vs {{right_country}} for immigration purposes.

**Information about {{left_country}}:**
{{left_context}}

**Information about {{right_country}}:**
{{right_context}}

---

Based on the information above, compare these two countries focusing on: {{metrics}}.

Provide a balanced, structured comparison with:
1. Key pros and cons for each country
2. Which is better for different scenarios (career, family, cost, lifestyle)
3. A summary recommendation

Be specific and cite information from the documents when available.";

/// Assemble the country-comparison prompt
pub fn build_comparison_prompt(
    left_country: &str,
    right_country: &str,
    left_context: &str,
    right_context: &str,
    metrics: &[String],
) -> Result<String> {
    let mut values = HashMap::new();
    values.insert("left_country".to_string(), left_country.to_string());
    values.insert("right_country".to_string(), right_country.to_string());
    values.insert("left_context".to_string(), left_context.to_string());
    values.insert("right_context".to_string(), right_context.to_string());
    values.insert("metrics".to_string(), metrics.join(", "));

    PromptTemplate::new(COMPARISON_TEMPLATE).render(&values)
}
