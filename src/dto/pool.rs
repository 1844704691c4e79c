//! Question pool payloads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::{QuestionEntity, QuestionPoolEntity},
    dto::validation::validate_not_blank,
};

/// Question as exposed to the admin panel, answer included.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: String,
    pub text: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_id: Option<String>,
}

impl From<QuestionEntity> for QuestionView {
    fn from(value: QuestionEntity) -> Self {
        Self {
            id: value.id,
            text: value.text,
            answer: value.answer,
            image_url: value.image_url,
            tile_number: value.tile_number,
            pool_id: value.pool_id,
        }
    }
}

impl From<QuestionView> for QuestionEntity {
    fn from(value: QuestionView) -> Self {
        Self {
            id: value.id,
            text: value.text,
            answer: value.answer,
            image_url: value.image_url,
            tile_number: value.tile_number,
            pool_id: value.pool_id,
        }
    }
}

/// Pool with its full question list.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PoolView {
    pub id: String,
    pub name: String,
    pub questions: Vec<QuestionView>,
}

impl From<QuestionPoolEntity> for PoolView {
    fn from(value: QuestionPoolEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            questions: value.questions.into_iter().map(Into::into).collect(),
        }
    }
}

/// Pool listing entry that leaves the answers out.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PoolSummary {
    pub id: String,
    pub name: String,
    pub question_count: usize,
}

impl From<&QuestionPoolEntity> for PoolSummary {
    fn from(value: &QuestionPoolEntity) -> Self {
        Self {
            id: value.id.clone(),
            name: value.name.clone(),
            question_count: value.questions.len(),
        }
    }
}

/// Request to create an empty pool.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePoolRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,
}

/// One question row of a bulk import.
#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRow {
    #[validate(custom(function = "validate_not_blank"))]
    pub text: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub answer: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Bulk import of question rows into an existing pool.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ImportQuestionsRequest {
    #[validate(length(min = 1), nested)]
    pub questions: Vec<QuestionRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_rejects_blank_rows_and_empty_batches() {
        let empty: ImportQuestionsRequest = serde_json::from_str(r#"{"questions":[]}"#).unwrap();
        assert!(empty.validate().is_err());

        let blank: ImportQuestionsRequest =
            serde_json::from_str(r#"{"questions":[{"text":"Capital of Peru?","answer":"  "}]}"#)
                .unwrap();
        assert!(blank.validate().is_err());

        let valid: ImportQuestionsRequest = serde_json::from_str(
            r#"{"questions":[{"text":"Capital of Peru?","answer":"Lima","imageUrl":"/uploads/peru.png"}]}"#,
        )
        .unwrap();
        assert!(valid.validate().is_ok());
        assert_eq!(
            valid.questions[0].image_url.as_deref(),
            Some("/uploads/peru.png")
        );
    }
}
