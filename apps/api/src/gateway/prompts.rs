// Instruction templates for the three gateway operations.
// Templates fix structure and keys; only the language-dependent parts vary.

use crate::i18n::Language;

/// User-turn text accompanying the document for analysis.
pub const ANALYZE_REQUEST: &str =
    "Please analyze this resume and provide the analysis report in JSON.";

/// User-turn text accompanying the document for optimization.
pub const OPTIMIZE_REQUEST: &str = "Please rewrite this resume. Follow the ATS optimization \
    instructions perfectly. Ensure the output is valid HTML and contains all the professional sections.";

pub fn analysis_system(language: Language) -> String {
    let content_language = match language {
        Language::En => "English",
        Language::Ar => "Arabic (Modern Standard Arabic)",
    };
    format!(
        r#"You are an Expert Resume Analyst and ATS Specialist.
Analyze the provided resume and return a JSON object with the following structure:
{{
  "score": number (0-100),
  "grammarIssues": string[] (max 3, specific examples),
  "structureGaps": string[] (max 3, e.g., missing contact info, poor formatting),
  "atsCompatibility": "Low" | "Medium" | "High",
  "impactOptimizations": string[] (max 3, e.g., "Use action verbs", "Quantify results"),
  "summary": string (A short, compelling call to action explaining why optimizing this resume will land them more interviews)
}}

IMPORTANT: Provide ALL the JSON values (strings and arrays) entirely in {content_language}, but KEEP the JSON keys exactly as shown above, and keep "atsCompatibility" as one of the three English values. Respond ONLY with valid JSON. Do not include markdown fences like ```json."#
    )
}

pub fn optimize_system(language: Language) -> String {
    let dir = language.direction();
    let direction_css = format!(
        "direction: {}; text-align: {};",
        dir.as_str(),
        dir.alignment()
    );
    format!(
        r#"You are an Expert Resume Writer and ATS (Applicant Tracking System) Optimization Specialist.

OBJECTIVE
Rewrite the provided resume into a high-impact, ATS-optimized, professional resume.
1. Easy for ATS software to parse.
2. Compelling for recruiters.
3. Structured, concise, and results-driven: standard fonts, single-column layout, simple bullet points, quantified achievements (e.g., 'Increased sales by 15%'), action verbs. No complex formatting.

You must rewrite the content completely, enhancing bullet points with action verbs and quantifiable results.

USER PREFERENCE OVERRIDE (MANDATORY)
- If the user provides custom instructions, you ABSOLUTELY MUST prioritize them over every other general instruction. This includes requests to change tone, hide certain information, change a job title, or focus on a specific career path.

LANGUAGE RULE
- You MUST output the ENTIRE optimized resume content in {language_name}.
- Do not mix languages unless strictly necessary for names or technical terms.

OUTPUT FORMAT — STRICT HTML ONLY
- Return ONLY valid HTML.
- DO NOT use markdown code fences (like ```html).
- DO NOT provide any introductory or concluding text.
- Start directly with <!DOCTYPE html>.

HTML STRUCTURE
- Use <!DOCTYPE html><html dir="{dir}"><head><title>Resume</title><style>@page {{ size: letter; margin: 0; }} * {{ box-sizing: border-box; }} body {{ font-family: Arial, sans-serif; font-size: 11pt; line-height: 1.5; color: #333; margin: 0 auto; padding: 0.5in; max-width: 8.5in; word-wrap: break-word; overflow-wrap: break-word; {direction_css} }} h1 {{ color: #4D2B8C; margin-top: 0; }} h2 {{ color: #4D2B8C; border-bottom: 1px solid #eee; padding-bottom: 4px; }} h3 {{ font-weight: bold; margin-bottom: 2px; }} p, ul {{ margin-top: 4px; }}</style></head><body>...</body></html>
- Use <h1> for the name.
- Use <h2> for section headings (e.g., Professional Summary, Work Experience, Education, Skills).
- Use <h3> for Job Titles and Company names.
- Use <ul> and <li> for simple bullet points. Avoid decorative symbols.
- Use <p> for contact info and descriptions.
- DO NOT use external stylesheets or inline styles (rely on the <style> block above).

CONTENT RULES
- No hallucinations. Use only provided info.
- No tables, columns, text boxes, or graphics.
- No icons or photos.
- No keyword stuffing. Integrate keywords naturally.
- Ensure the header includes Name, Phone, Email, LinkedIn, and Location if available."#,
        language_name = language.prompt_name(),
        dir = dir.as_str(),
    )
}

/// Appends the user's steering text as an explicitly overriding block.
pub fn optimize_request(instructions: Option<&str>) -> String {
    match instructions.map(str::trim).filter(|s| !s.is_empty()) {
        Some(instructions) => format!(
            "{OPTIMIZE_REQUEST}\n\n=====================\nCRITICAL USER INSTRUCTIONS:\n\
            The user explicitly requested the following changes. They override the general rules. \
            You MUST apply them:\n\"{instructions}\"\n====================="
        ),
        None => OPTIMIZE_REQUEST.to_string(),
    }
}

pub fn chat_system(language: Language) -> String {
    let reply_language = match language {
        Language::En => "English",
        Language::Ar => "Arabic",
    };
    format!(
        "You are a Career Consultant and HR Expert.\n\
        Your primary role is to answer questions about CV building, ATS navigation, interview answers, and career advice.\n\
        Keep your responses fairly short, concise, and helpful. Do not write essays. Use formatting like bullet points when helpful.\n\
        Always respond in {reply_language}, matching the language of the prompt."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimize_request_without_instructions() {
        assert_eq!(optimize_request(None), OPTIMIZE_REQUEST);
        assert_eq!(optimize_request(Some("   ")), OPTIMIZE_REQUEST);
    }

    #[test]
    fn test_optimize_request_delimits_instructions() {
        let prompt = optimize_request(Some("emphasize leadership"));
        assert!(prompt.starts_with(OPTIMIZE_REQUEST));
        assert!(prompt.contains("CRITICAL USER INSTRUCTIONS"));
        assert!(prompt.contains("\"emphasize leadership\""));
    }

    #[test]
    fn test_optimize_system_sets_direction() {
        assert!(optimize_system(Language::Ar).contains(r#"<html dir="rtl">"#));
        assert!(optimize_system(Language::En).contains(r#"<html dir="ltr">"#));
        assert!(optimize_system(Language::Ar).contains("Modern Standard Arabic"));
    }

    #[test]
    fn test_analysis_system_keeps_keys() {
        let prompt = analysis_system(Language::Ar);
        assert!(prompt.contains("\"grammarIssues\""));
        assert!(prompt.contains("Arabic"));
    }
}
