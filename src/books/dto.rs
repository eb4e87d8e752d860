use serde::Serialize;
use uuid::Uuid;

/// Response for a successful create: the new book's identifier only.
#[derive(Debug, Serialize)]
pub struct CreateBookResponse {
    pub id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_response_shape() {
        let id = Uuid::new_v4();
        let json = serde_json::to_value(CreateBookResponse { id }).unwrap();
        assert_eq!(json["id"], serde_json::json!(id.to_string()));
        assert_eq!(json.as_object().unwrap().len(), 1);
    }
}
