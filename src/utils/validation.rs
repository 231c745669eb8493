use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{AppError, Result};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

pub struct Validator;

impl Validator {
    pub fn validate_email(email: &str) -> Result<()> {
        if !EMAIL_RE.is_match(email) {
            return Err(AppError::ValidationError("Invalid email format".to_string()));
        }
        if email.len() > 254 {
            return Err(AppError::ValidationError("Email too long".to_string()));
        }
        Ok(())
    }

    pub fn validate_password(password: &str) -> Result<()> {
        if password.len() < 8 {
            return Err(AppError::ValidationError(
                "Password must be at least 8 characters long".to_string(),
            ));
        }
        if password.len() > 128 {
            return Err(AppError::ValidationError(
                "Password must be less than 128 characters".to_string(),
            ));
        }
        Ok(())
    }

    /// Chat message bodies are capped at 2000 characters, matching the
    /// stored column limit.
    pub fn validate_message(message: &str) -> Result<()> {
        if message.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Message content is required".to_string(),
            ));
        }
        if message.chars().count() > 2000 {
            return Err(AppError::ValidationError(
                "Message cannot exceed 2000 characters".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_feedback(feedback: &str) -> Result<()> {
        if feedback.chars().count() > 500 {
            return Err(AppError::ValidationError(
                "Feedback cannot exceed 500 characters".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_rating(rating: i64) -> Result<()> {
        if !(1..=5).contains(&rating) {
            return Err(AppError::ValidationError(
                "Rating must be between 1 and 5".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_faq_question(question: &str) -> Result<()> {
        if question.trim().is_empty() {
            return Err(AppError::ValidationError("Question is required".to_string()));
        }
        if question.chars().count() > 500 {
            return Err(AppError::ValidationError(
                "Question cannot exceed 500 characters".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_faq_answer(answer: &str) -> Result<()> {
        if answer.trim().is_empty() {
            return Err(AppError::ValidationError("Answer is required".to_string()));
        }
        if answer.chars().count() > 2000 {
            return Err(AppError::ValidationError(
                "Answer cannot exceed 2000 characters".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_rules() {
        assert!(Validator::validate_email("student@jecrc.ac.in").is_ok());
        assert!(Validator::validate_email("not-an-email").is_err());
    }

    #[test]
    fn message_rules() {
        assert!(Validator::validate_message("hello").is_ok());
        assert!(Validator::validate_message("   ").is_err());
        assert!(Validator::validate_message(&"x".repeat(2001)).is_err());
    }

    #[test]
    fn rating_bounds() {
        assert!(Validator::validate_rating(1).is_ok());
        assert!(Validator::validate_rating(5).is_ok());
        assert!(Validator::validate_rating(0).is_err());
        assert!(Validator::validate_rating(6).is_err());
    }
}
