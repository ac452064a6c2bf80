use axum::extract::Multipart;
use std::collections::HashMap;

use crate::adapters::http::error::ApiError;

const IMAGE_FIELD: &str = "image";

/// Formulario multipart con un campo `image` y campos de texto opcionales.
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub fields: HashMap<String, String>,
}

impl Upload {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

pub async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    let mut image: Option<(String, Vec<u8>)> = None;
    let mut fields = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("multipart inválido: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == IMAGE_FIELD {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("lectura de la imagen: {e}")))?;
            image = Some((filename, bytes.to_vec()));
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::bad_request(format!("campo {name}: {e}")))?;
            fields.insert(name, value);
        }
    }

    let (filename, bytes) = image.ok_or_else(|| ApiError::bad_request("No image uploaded"))?;
    if filename.is_empty() {
        return Err(ApiError::bad_request("No image selected"));
    }
    Ok(Upload { filename, bytes, fields })
}
