/// Outcome of checking a candidate profile name against every naming rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileValidation {
    pub errors: Vec<String>,
}

impl ProfileValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check `name` against all rules at once; a name may break several.
pub fn validate_profile_name<S: AsRef<str>>(name: &str, existing_profiles: &[S]) -> ProfileValidation {
    let mut errors = Vec::new();

    if name.trim().is_empty() {
        errors.push("Profile name cannot be empty.".to_string());
    }

    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        errors.push(
            "Profile name must contain only letters and numbers (no spaces or special characters)."
                .to_string(),
        );
    }

    if existing_profiles.iter().any(|p| p.as_ref() == name) {
        errors.push("Profile name must be unique.".to_string());
    }

    ProfileValidation { errors }
}
