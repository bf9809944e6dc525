/// Client endpoints
///
/// Every route here sits behind bearer authentication and a per-route
/// permission check (see [`crate::app::build_router`]).
///
/// # Endpoints
///
/// - `GET /client` - List clients (`index`)
/// - `POST /client` - Create a client (`create`)
/// - `GET /client/:id` - Show a client (`show`)
/// - `PUT /client/:id` - Update a client (`update`)
/// - `DELETE /client/:id` - Delete a client (`destroy`)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{Json, Path},
    routes::{DataResponse, MessageResponse},
    validation::{taken_message, FieldErrors, Payload},
};
use axum::{extract::State, http::StatusCode};
use projectdesk_shared::models::client::{Client, ClientData};
use serde_json::Value;
use validator::Validate;

/// Body of create and update requests
#[derive(Debug, Default, Validate)]
pub struct ClientRequest {
    #[validate(
        required(message = "The code field is required."),
        length(max = 255, message = "The code field must not be greater than 255 characters.")
    )]
    pub code: Option<String>,

    #[validate(
        required(message = "The name field is required."),
        length(max = 255, message = "The name field must not be greater than 255 characters.")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "The lastname field is required."),
        length(max = 255, message = "The lastname field must not be greater than 255 characters.")
    )]
    pub lastname: Option<String>,

    #[validate(
        required(message = "The phone field is required."),
        length(max = 20, message = "The phone field must not be greater than 20 characters.")
    )]
    pub phone: Option<String>,
}

impl ClientRequest {
    /// Reads the body and checks the declared rules
    fn parse(body: Value) -> ApiResult<(Self, FieldErrors)> {
        let mut payload = Payload::new(body)?;

        let req = Self {
            code: payload.text("code"),
            name: payload.text("name"),
            lastname: payload.text("lastname"),
            phone: payload.text("phone"),
        };

        let errors = payload.finish(&req);
        Ok((req, errors))
    }

    /// Adds the code uniqueness check to `errors` and fails if any
    ///
    /// `except_id` is the client being updated, whose own code doesn't count
    /// as taken.
    async fn validate_with(
        self,
        mut errors: FieldErrors,
        state: &AppState,
        except_id: Option<i64>,
    ) -> ApiResult<ClientData> {
        if let Some(code) = self.code.as_deref() {
            if !errors.has("code") && Client::code_taken(&state.db, code, except_id).await? {
                errors.add("code", taken_message("code"));
            }
        }

        errors.into_result()?;

        // Every field is present once validation passed
        Ok(ClientData {
            code: self.code.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            lastname: self.lastname.unwrap_or_default(),
            phone: self.phone.unwrap_or_default(),
        })
    }
}

/// List all clients, ordered by id
pub async fn list_clients(
    State(state): State<AppState>,
) -> ApiResult<axum::Json<DataResponse<Vec<Client>>>> {
    let clients = Client::list(&state.db).await?;

    Ok(DataResponse::new("Client list", clients))
}

/// Create a client
///
/// # Errors
///
/// - `422 Unprocessable Entity`: A field is missing or too long, or the
///   code is already taken
pub async fn create_client(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, axum::Json<DataResponse<Client>>)> {
    let (req, errors) = ClientRequest::parse(body)?;
    let data = req.validate_with(errors, &state, None).await?;
    let client = Client::create(&state.db, data).await?;

    tracing::info!(client_id = client.id, code = %client.code, "Client created");

    Ok(DataResponse::created("Client created", client))
}

/// Show a client
pub async fn show_client(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<axum::Json<DataResponse<Client>>> {
    let client = Client::find_by_id(&state.db, id)
        .await?
        .ok_or_else(ApiError::not_found)?;

    Ok(DataResponse::new("Client found", client))
}

/// Update a client
///
/// All fields are required; the code may stay the same.
pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> ApiResult<axum::Json<DataResponse<Client>>> {
    if Client::find_by_id(&state.db, id).await?.is_none() {
        return Err(ApiError::not_found());
    }

    let (req, errors) = ClientRequest::parse(body)?;
    let data = req.validate_with(errors, &state, Some(id)).await?;

    let client = Client::update(&state.db, id, data)
        .await?
        .ok_or_else(ApiError::not_found)?;

    tracing::info!(client_id = client.id, "Client updated");

    Ok(DataResponse::new("Client updated", client))
}

/// Delete a client
pub async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<axum::Json<MessageResponse>> {
    if !Client::delete(&state.db, id).await? {
        return Err(ApiError::not_found());
    }

    tracing::info!(client_id = id, "Client deleted");

    Ok(MessageResponse::new("Client deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn errors_for(body: Value) -> FieldErrors {
        ClientRequest::parse(body).unwrap().1
    }

    #[test]
    fn test_client_rules() {
        let errors = errors_for(json!({
            "code": "CL100",
            "lastname": "Quispe",
            "phone": "+51 999 888 777 666 555 444",
        }));

        assert_eq!(errors.get("name").unwrap(), ["The name field is required."]);
        assert_eq!(
            errors.get("phone").unwrap(),
            ["The phone field must not be greater than 20 characters."]
        );
        assert!(!errors.has("code"));
        assert!(!errors.has("lastname"));
    }

    #[test]
    fn test_blank_fields_are_required() {
        let errors = errors_for(json!({
            "code": "",
            "name": "",
            "lastname": "  ",
            "phone": "",
        }));

        assert_eq!(errors.len(), 4);
        for field in ["code", "name", "lastname", "phone"] {
            assert_eq!(
                errors.get(field).unwrap(),
                [format!("The {} field is required.", field)]
            );
        }
    }

    #[test]
    fn test_values_are_trimmed_and_numbers_accepted() {
        let (req, errors) = ClientRequest::parse(json!({
            "code": " CL200 ",
            "name": "Ana",
            "lastname": "Torres",
            "phone": 987654321,
        }))
        .unwrap();

        assert!(errors.is_empty());
        assert_eq!(req.code.as_deref(), Some("CL200"));
        assert_eq!(req.phone.as_deref(), Some("987654321"));
    }

    #[test]
    fn test_wrong_types_reported_per_field() {
        let errors = errors_for(json!({
            "code": { "value": "CL1" },
            "name": true,
            "lastname": "Paz",
            "phone": "123",
        }));

        assert_eq!(errors.get("code").unwrap(), ["The code field must be a string."]);
        assert_eq!(errors.get("name").unwrap(), ["The name field must be a string."]);
        assert_eq!(errors.len(), 2);
    }
}
