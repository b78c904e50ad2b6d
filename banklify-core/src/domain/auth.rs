//! Login and registration payloads

use std::fmt;

use serde::{Deserialize, Serialize};

use super::result::{Error, Result};
use super::session::BearerToken;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Body of `POST /auth/login`
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password: password.into(),
        }
    }

    /// Both fields are required by the login form
    pub fn validate(&self) -> Result<()> {
        if self.email.is_empty() {
            return Err(Error::validation("Il campo Email è obbligatorio."));
        }
        if self.password.is_empty() {
            return Err(Error::validation("Il campo Password è obbligatorio."));
        }
        Ok(())
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Response of `POST /auth/login`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: BearerToken,
    #[serde(alias = "accountIdentifier")]
    pub iban: String,
    #[serde(default)]
    pub first_name: Option<String>,
}

/// Registration form as filled in by the user
///
/// `confirm_password` only exists client-side; [`RegistrationForm::validate`]
/// turns the form into the [`RegisterRequest`] that goes on the wire.
#[derive(Clone, Default)]
pub struct RegistrationForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
    pub tax_code: String,
    pub street: String,
    pub house_number: String,
    pub city: String,
    pub province: String,
    pub zip_code: String,
    pub phone_number: String,
}

impl fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish_non_exhaustive()
    }
}

/// Body of `POST /auth/register`
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub tax_code: String,
    pub street: String,
    pub house_number: String,
    pub city: String,
    pub province: String,
    pub zip_code: String,
    pub phone_number: String,
}

impl RegisterRequest {
    pub fn credentials(&self) -> LoginCredentials {
        LoginCredentials::new(self.email.clone(), self.password.clone())
    }
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl RegistrationForm {
    /// Check the form and build the request.
    ///
    /// Password rules come first (mismatch, then length), then required
    /// fields in form order, then the fixed-width fields.
    pub fn validate(&self) -> Result<RegisterRequest> {
        if self.password != self.confirm_password {
            return Err(Error::validation("Le password non coincidono."));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::validation(format!(
                "La password deve essere di almeno {} caratteri.",
                MIN_PASSWORD_LEN
            )));
        }

        let required = [
            ("Nome", &self.first_name),
            ("Cognome", &self.last_name),
            ("Codice Fiscale", &self.tax_code),
            ("Via / Piazza", &self.street),
            ("N° Civico", &self.house_number),
            ("CAP", &self.zip_code),
            ("Città", &self.city),
            ("Provincia", &self.province),
            ("Telefono", &self.phone_number),
            ("Email", &self.email),
        ];
        if let Some((label, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(Error::validation(format!("Il campo {} è obbligatorio.", label)));
        }

        if !self.email.contains('@') {
            return Err(Error::validation("Indirizzo email non valido."));
        }

        let tax_code = self.tax_code.trim().to_uppercase();
        if tax_code.chars().count() > 16 {
            return Err(Error::validation(
                "Il codice fiscale non può superare 16 caratteri.",
            ));
        }

        let province = self.province.trim().to_uppercase();
        if province.chars().count() > 2 {
            return Err(Error::validation("La provincia deve essere di 2 caratteri."));
        }

        let zip_code = self.zip_code.trim().to_string();
        if zip_code.chars().count() > 5 {
            return Err(Error::validation("Il CAP non può superare 5 caratteri."));
        }

        Ok(RegisterRequest {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            tax_code,
            street: self.street.trim().to_string(),
            house_number: self.house_number.trim().to_string(),
            city: self.city.trim().to_string(),
            province,
            zip_code,
            phone_number: self.phone_number.trim().to_string(),
        })
    }
}
