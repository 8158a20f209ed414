//! Per-field validation of write bodies. Failures are collected across all
//! fields before returning, so a bad request reports everything at once.
//! Messages are the user-facing French strings carried over from the forms.

use bouture_types::api::{AdInput, CategoryInput, MessageInput, PlantInput, UserInput};

use crate::error::{Error, FieldErrors};

pub fn validate_ad(input: &AdInput) -> Result<(), Error> {
    let mut errors = FieldErrors::new();

    if input.title.as_deref().is_none_or(|t| t.trim().is_empty()) {
        errors.push("title", "Veuillez indiquer un titre à votre annonce");
    }
    if input.city.as_deref().is_none_or(|c| c.trim().is_empty()) {
        errors.push("city", "Veuillez indiquer une ville");
    }
    match input.quantity {
        None => errors.push(
            "quantity",
            "Veuillez indiquer la quantité que vous souhaitez donner",
        ),
        Some(q) if q < 1 => errors.push("quantity", "La quantité doit être d'au moins 1"),
        Some(_) => {}
    }
    if input.category.is_none() {
        errors.push("category", "Choisissez votre catégorie");
    }
    if input.growth.is_none() {
        errors.push("growth", "Choisissez le stade évolutif");
    }

    errors.into_result()
}

/// `require_password` is set on account creation; profile edits may leave
/// the password untouched.
pub fn validate_user(input: &UserInput, require_password: bool) -> Result<(), Error> {
    let mut errors = FieldErrors::new();

    match input.email.as_deref() {
        None => errors.push("email", "Veuillez saisir une adresse email valide"),
        Some(email) if !looks_like_email(email) => {
            errors.push("email", "Veuillez saisir une adresse email valide");
        }
        Some(_) => {}
    }
    if input.pseudo.as_deref().is_none_or(|p| p.trim().is_empty()) {
        errors.push("pseudo", "veuillez saisir votre Pseudo");
    }
    match input.password.as_deref() {
        None if require_password => {
            errors.push("password", "Votre message doit faire minimum 6 caractères");
        }
        Some(p) if p.chars().count() < 6 => {
            errors.push("password", "Votre message doit faire minimum 6 caractères");
        }
        Some(p) if p.chars().count() > 100 => {
            errors.push("password", "Votre message doit faire maximum 100 caractères");
        }
        _ => {}
    }

    errors.into_result()
}

pub fn validate_message(input: &MessageInput) -> Result<(), Error> {
    let mut errors = FieldErrors::new();

    if input.content.as_deref().is_none_or(|c| c.trim().is_empty()) {
        errors.push("content", "Veuillez indiquer votre message");
    }
    if input.ad.is_none() {
        errors.push("ad", "Veuillez indiquer l'annonce concernée");
    }

    errors.into_result()
}

pub fn validate_plant(input: &PlantInput) -> Result<(), Error> {
    let mut errors = FieldErrors::new();

    if input.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
        errors.push("name", "Veuillez indiquer un nom");
    }
    if input.category.is_none() {
        errors.push("category", "Choisissez votre catégorie");
    }
    if let Some(d) = input.difficulty
        && !(0..=5).contains(&d)
    {
        errors.push("difficulty", "La difficulté doit être comprise entre 0 et 5");
    }

    errors.into_result()
}

pub fn validate_category(input: &CategoryInput) -> Result<(), Error> {
    let mut errors = FieldErrors::new();

    if input.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
        errors.push("name", "Veuillez indiquer un nom");
    }

    errors.into_result()
}

fn looks_like_email(s: &str) -> bool {
    // Shape check only; deliverability is the mail system's problem.
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ad_errors_are_collected_per_field() {
        let err = validate_ad(&AdInput::default()).unwrap_err();
        let Error::Validation(errors) = err else {
            panic!("expected validation error");
        };
        for field in ["title", "city", "quantity", "category", "growth"] {
            assert!(errors.field(field).is_some(), "missing error for {field}");
        }
    }

    #[test]
    fn valid_ad_passes() {
        let input = AdInput {
            title: Some("Bouture de monstera".into()),
            city: Some("Nantes".into()),
            quantity: Some(2),
            category: Some(uuid::Uuid::new_v4()),
            growth: Some(uuid::Uuid::new_v4()),
            ..Default::default()
        };
        assert!(validate_ad(&input).is_ok());
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let input = AdInput {
            title: Some("x".into()),
            city: Some("Nantes".into()),
            quantity: Some(0),
            category: Some(uuid::Uuid::new_v4()),
            growth: Some(uuid::Uuid::new_v4()),
            ..Default::default()
        };
        let Error::Validation(errors) = validate_ad(&input).unwrap_err() else {
            panic!("expected validation error");
        };
        assert!(errors.field("quantity").is_some());
    }

    #[test]
    fn user_email_shape_is_checked() {
        let mut input = UserInput {
            email: Some("pas-une-adresse".into()),
            password: Some("secret123".into()),
            pseudo: Some("jean".into()),
            ..Default::default()
        };
        assert!(validate_user(&input, true).is_err());

        input.email = Some("jean@exemple.fr".into());
        assert!(validate_user(&input, true).is_ok());
    }

    #[test]
    fn password_bounds_are_enforced() {
        let base = UserInput {
            email: Some("jean@exemple.fr".into()),
            pseudo: Some("jean".into()),
            ..Default::default()
        };

        let short = UserInput {
            password: Some("abc".into()),
            ..clone_base(&base)
        };
        assert!(validate_user(&short, true).is_err());

        let missing = clone_base(&base);
        assert!(validate_user(&missing, true).is_err());
        // An edit without a password change is fine.
        assert!(validate_user(&missing, false).is_ok());
    }

    fn clone_base(base: &UserInput) -> UserInput {
        UserInput {
            email: base.email.clone(),
            pseudo: base.pseudo.clone(),
            ..Default::default()
        }
    }

    #[test]
    fn plant_difficulty_range() {
        let input = PlantInput {
            name: Some("Pilea".into()),
            category: Some(uuid::Uuid::new_v4()),
            difficulty: Some(9),
            ..Default::default()
        };
        let Error::Validation(errors) = validate_plant(&input).unwrap_err() else {
            panic!("expected validation error");
        };
        assert!(errors.field("difficulty").is_some());
    }
}
