//! Round payloads for the admin panel and the public board.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::{QuestionEntity, RoundEntity},
    dto::{pool::QuestionView, validation::validate_not_blank},
};

/// Round with its active questions, answers included.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoundView {
    pub id: String,
    pub name: String,
    pub tile_count: u32,
    pub background_image: String,
    pub order: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_pool_id: Option<String>,
    pub active_questions: Vec<QuestionView>,
    pub points_per_question: u32,
}

impl From<RoundEntity> for RoundView {
    fn from(value: RoundEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            tile_count: value.tile_count,
            background_image: value.background_image,
            order: value.order,
            question_pool_id: value.question_pool_id,
            active_questions: value.active_questions.into_iter().map(Into::into).collect(),
            points_per_question: value.points_per_question,
        }
    }
}

/// Question bound to a tile, without its answer.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TileQuestionView {
    pub tile_number: u32,
    pub question_id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl TileQuestionView {
    /// Build the view for a question known to be bound to `tile_number`.
    pub fn new(tile_number: u32, question: &QuestionEntity) -> Self {
        Self {
            tile_number,
            question_id: question.id.clone(),
            text: question.text.clone(),
            image_url: question.image_url.clone(),
        }
    }
}

/// Round as shown to spectators: tile numbers only, no answers.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicRoundView {
    pub id: String,
    pub name: String,
    pub order: usize,
    pub background_image: String,
    pub points_per_question: u32,
    pub tile_numbers: Vec<u32>,
}

impl From<&RoundEntity> for PublicRoundView {
    fn from(value: &RoundEntity) -> Self {
        let mut tile_numbers: Vec<u32> = value
            .active_questions
            .iter()
            .filter_map(|question| question.tile_number)
            .collect();
        tile_numbers.sort_unstable();
        Self {
            id: value.id.clone(),
            name: value.name.clone(),
            order: value.order,
            background_image: value.background_image.clone(),
            points_per_question: value.points_per_question,
            tile_numbers,
        }
    }
}

/// Request to append a new round.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoundRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,
    /// Falls back to the settings' tile count.
    #[serde(default)]
    #[validate(range(min = 1))]
    pub tile_count: Option<u32>,
    /// Falls back to the settings' background image.
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub question_pool_id: Option<String>,
    #[serde(default)]
    pub points_per_question: Option<u32>,
}

/// Merge-patch of a round. Omitted fields are left untouched.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoundRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank"))]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(range(min = 1))]
    pub tile_count: Option<u32>,
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub points_per_question: Option<u32>,
    /// Omitted keeps the pool, `null` detaches it, a string points to another pool.
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub question_pool_id: Option<Option<String>>,
    /// Replaces the active questions; `[]` clears them. Tile numbers must cover `1..=len`.
    #[serde(default)]
    pub active_questions: Option<Vec<QuestionView>>,
}

/// Move a round to an absolute position.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRoundRequest {
    pub new_order: usize,
}

/// Relative move of a round by one slot.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

/// Request body of the relative move adapter.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MoveRoundRequest {
    pub direction: MoveDirection,
}

/// Draw questions from a pool into a round.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignQuestionsRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub pool_id: String,
    #[validate(range(min = 1))]
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_distinguishes_null_from_omitted_pool() {
        let omitted: UpdateRoundRequest = serde_json::from_str(r#"{"name":"Finale"}"#).unwrap();
        assert_eq!(omitted.question_pool_id, None);
        assert!(omitted.active_questions.is_none());

        let detached: UpdateRoundRequest =
            serde_json::from_str(r#"{"questionPoolId":null,"activeQuestions":[]}"#).unwrap();
        assert_eq!(detached.question_pool_id, Some(None));
        assert_eq!(detached.active_questions.map(|q| q.len()), Some(0));

        let moved: UpdateRoundRequest =
            serde_json::from_str(r#"{"questionPoolId":"p2"}"#).unwrap();
        assert_eq!(moved.question_pool_id, Some(Some("p2".into())));
    }

    #[test]
    fn assign_requires_pool_and_positive_count() {
        let zero: AssignQuestionsRequest =
            serde_json::from_str(r#"{"poolId":"p1","count":0}"#).unwrap();
        assert!(zero.validate().is_err());

        let no_pool: AssignQuestionsRequest =
            serde_json::from_str(r#"{"poolId":"","count":3}"#).unwrap();
        assert!(no_pool.validate().is_err());

        let ok: AssignQuestionsRequest =
            serde_json::from_str(r#"{"poolId":"p1","count":3}"#).unwrap();
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn public_round_lists_sorted_tiles() {
        let question = |id: &str, tile| QuestionEntity {
            id: id.into(),
            text: "?".into(),
            answer: "!".into(),
            image_url: None,
            tile_number: Some(tile),
            pool_id: None,
        };
        let round = RoundEntity {
            id: "r".into(),
            name: "Round".into(),
            tile_count: 16,
            background_image: String::new(),
            order: 0,
            question_pool_id: None,
            active_questions: vec![question("a", 2), question("b", 1)],
            points_per_question: 100,
        };
        assert_eq!(PublicRoundView::from(&round).tile_numbers, vec![1, 2]);
    }
}
