//! Output languages and the handful of user-facing strings the service emits itself.

use serde::{Deserialize, Serialize};

/// Language tag used both for the generated resume and for service messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ar,
}

/// Writing direction of a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    Ltr,
    Rtl,
}

impl TextDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            TextDirection::Ltr => "ltr",
            TextDirection::Rtl => "rtl",
        }
    }

    /// CSS `text-align` value matching the direction.
    pub fn alignment(self) -> &'static str {
        match self {
            TextDirection::Ltr => "left",
            TextDirection::Rtl => "right",
        }
    }
}

impl Language {
    pub fn direction(self) -> TextDirection {
        match self {
            Language::En => TextDirection::Ltr,
            Language::Ar => TextDirection::Rtl,
        }
    }

    /// How prompts refer to the language when instructing the model.
    pub fn prompt_name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Ar => "professional Modern Standard Arabic",
        }
    }

    pub fn messages(self) -> &'static Messages {
        match self {
            Language::En => &EN,
            Language::Ar => &AR,
        }
    }
}

pub struct Messages {
    pub upload_error_type: &'static str,
    pub upload_error_size: &'static str,
    pub upload_error_empty: &'static str,
    pub chat_welcome: &'static str,
    pub chat_fallback: &'static str,
    pub docx_failed: &'static str,
}

static EN: Messages = Messages {
    upload_error_type: "Please upload a PDF or an Image of your resume.",
    upload_error_size: "File is too large. Maximum 10MB.",
    upload_error_empty: "The uploaded file is empty.",
    chat_welcome: "Hi! I'm your Career Consultant AI. Ask me about ATS algorithms, CV improvements, or interview tips!",
    chat_fallback: "Oops! I encountered an error. Please try again later.",
    docx_failed: "There was an error generating the DOCX. Please try again or download the PDF.",
};

static AR: Messages = Messages {
    upload_error_type: "يرجى رفع ملف PDF أو صورة لسيرتك الذاتية.",
    upload_error_size: "الملف كبير جداً. الحد الأقصى 10 ميجابايت.",
    upload_error_empty: "الملف المرفوع فارغ.",
    chat_welcome: "أهلاً بك! أنا مستشارك المهني المدعوم بالذكاء الاصطناعي. اسألني عن أنظمة ATS، تحسين سيرتك الذاتية، أو نصائح المقابلات!",
    chat_fallback: "عذراً! واجهت خطأ. يرجى المحاولة مرة أخرى.",
    docx_failed: "حدث خطأ أثناء إنشاء ملف DOCX. يرجى المحاولة مرة أخرى أو تنزيل ملف PDF.",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_serde_uses_tags() {
        let lang: Language = serde_json::from_str(r#""ar""#).unwrap();
        assert_eq!(lang, Language::Ar);
        assert_eq!(serde_json::to_string(&Language::En).unwrap(), r#""en""#);
    }

    #[test]
    fn test_arabic_is_rtl() {
        assert_eq!(Language::Ar.direction(), TextDirection::Rtl);
        assert_eq!(Language::Ar.direction().alignment(), "right");
        assert_eq!(Language::En.direction().as_str(), "ltr");
    }

    #[test]
    fn test_messages_are_localized() {
        assert_ne!(
            Language::En.messages().chat_fallback,
            Language::Ar.messages().chat_fallback
        );
    }
}
