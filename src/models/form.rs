//! Inbound contact-form body.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw contact-form fields as posted by the website.
///
/// The form is published in English and Spanish, so each field also accepts
/// its Spanish name. Numeric JSON values (a phone typed into a number input)
/// are accepted as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadForm {
    #[serde(
        default,
        alias = "Nombre",
        alias = "nombre",
        deserialize_with = "deserialize_lenient_string"
    )]
    pub name: Option<String>,

    #[serde(
        default,
        alias = "Empresa",
        alias = "empresa",
        deserialize_with = "deserialize_lenient_string"
    )]
    pub company: Option<String>,

    #[serde(
        default,
        alias = "Email",
        alias = "correo",
        deserialize_with = "deserialize_lenient_string"
    )]
    pub email: Option<String>,

    #[serde(
        default,
        alias = "Telefono",
        alias = "telefono",
        alias = "Teléfono",
        deserialize_with = "deserialize_lenient_string"
    )]
    pub phone: Option<String>,

    #[serde(
        default,
        alias = "Mensaje",
        alias = "mensaje",
        deserialize_with = "deserialize_lenient_string"
    )]
    pub message: Option<String>,
}

/// Custom deserializer that accepts strings, numbers, booleans and null.
fn deserialize_lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(LenientStringVisitor)
}

struct LenientStringVisitor;

impl<'de> Visitor<'de> for LenientStringVisitor {
    type Value = Option<String>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, number, boolean or null")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(Some(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}
