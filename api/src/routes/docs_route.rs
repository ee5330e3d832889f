//! GET /docs (Swagger UI) and GET /openapi.json.

use axum::{Json, response::Html};
use serde_json::{Value, json};

const SWAGGER_UI: &str = r##"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Aurora QA System - API docs</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    window.onload = () => {
      window.ui = SwaggerUIBundle({ url: "/openapi.json", dom_id: "#swagger-ui" });
    };
  </script>
</body>
</html>
"##;

pub async fn docs() -> Html<&'static str> {
    Html(SWAGGER_UI)
}

pub async fn openapi() -> Json<Value> {
    Json(openapi_document())
}

fn openapi_document() -> Value {
    let error = json!({ "$ref": "#/components/schemas/Error" });
    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "Aurora QA System",
            "description": "Answers natural-language questions about concierge members from their messages.",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "paths": {
            "/": {
                "get": {
                    "summary": "Liveness",
                    "responses": { "200": { "description": "Service is up",
                        "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Health" } } } } }
                }
            },
            "/ask": {
                "post": {
                    "summary": "Answer a question about members",
                    "requestBody": {
                        "required": true,
                        "content": { "application/json": { "schema": { "$ref": "#/components/schemas/AskRequest" } } }
                    },
                    "responses": {
                        "200": { "description": "Answer",
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/AskResponse" } } } },
                        "400": { "description": "Invalid question", "content": { "application/json": { "schema": error } } },
                        "502": { "description": "Completion backend failed", "content": { "application/json": { "schema": error } } }
                    }
                }
            },
            "/stats": {
                "get": {
                    "summary": "Dataset statistics",
                    "responses": { "200": { "description": "Message counts per member",
                        "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Stats" } } } } }
                }
            }
        },
        "components": {
            "schemas": {
                "AskRequest": {
                    "type": "object",
                    "required": ["question"],
                    "properties": { "question": { "type": "string", "example": "When is Layla planning her trip to London?" } }
                },
                "AskResponse": {
                    "type": "object",
                    "required": ["answer"],
                    "properties": { "answer": { "type": "string" } }
                },
                "Health": {
                    "type": "object",
                    "properties": {
                        "status": { "type": "string" },
                        "service": { "type": "string" },
                        "version": { "type": "string" }
                    }
                },
                "Stats": {
                    "type": "object",
                    "properties": {
                        "total_messages": { "type": "integer" },
                        "unique_users": { "type": "integer" },
                        "users": { "type": "object", "additionalProperties": { "type": "integer" } }
                    }
                },
                "Error": {
                    "type": "object",
                    "required": ["detail"],
                    "properties": { "detail": { "type": "string" } }
                }
            }
        }
    })
}
