use serde::{Deserialize, Serialize};

/// Points awarded per question when a round does not specify its own value.
pub const DEFAULT_POINTS_PER_QUESTION: u32 = 100;
/// Tile count used when neither the round nor the settings provide one.
pub const DEFAULT_TILE_COUNT: u32 = 16;
/// Icon given to players created without one.
pub const DEFAULT_PLAYER_ICON: &str = "/vercel.svg";

/// Trivia question, either stored in a pool or copied into a round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionEntity {
    /// Opaque identifier derived from the creation instant.
    pub id: String,
    /// Question prompt shown to the players.
    pub text: String,
    /// Expected answer, compared trimmed and case-insensitively.
    pub answer: String,
    /// Optional illustration (public path returned by the upload service).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Tile bound to this question, only set on a round's active copies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_number: Option<u32>,
    /// Pool the question was imported into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_id: Option<String>,
}

/// Named collection of reusable questions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPoolEntity {
    /// Opaque identifier derived from the creation instant.
    pub id: String,
    /// Display name of the pool.
    pub name: String,
    /// Questions in insertion order.
    #[serde(default)]
    pub questions: Vec<QuestionEntity>,
}

/// Ordered stage of the game with its own tile grid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundEntity {
    /// Opaque identifier derived from the creation instant.
    pub id: String,
    /// Display name of the round.
    pub name: String,
    /// Number of tiles the admin planned for the grid.
    #[serde(default = "default_tile_count")]
    pub tile_count: u32,
    /// Image revealed behind the tiles.
    #[serde(default)]
    pub background_image: String,
    /// Dense zero-based rank among all rounds.
    #[serde(default)]
    pub order: usize,
    /// Pool the active questions were drawn from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_pool_id: Option<String>,
    /// Snapshot copies of the drawn questions, each bound to a tile.
    #[serde(default)]
    pub active_questions: Vec<QuestionEntity>,
    /// Points a correct answer is worth in this round.
    #[serde(default = "default_points_per_question")]
    pub points_per_question: u32,
}

/// Process-wide presentation defaults and the live round pointer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SettingsEntity {
    /// Default tile count for new rounds.
    #[serde(default = "default_tile_count")]
    pub tile_count: u32,
    /// Default background image.
    #[serde(default)]
    pub background_image: String,
    /// Name given to score points on the scoreboard (e.g. "coins").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points_name: Option<String>,
    /// Identifier of the round currently live on the game boards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_round: Option<String>,
}

impl Default for SettingsEntity {
    fn default() -> Self {
        Self {
            tile_count: DEFAULT_TILE_COUNT,
            background_image: String::new(),
            points_name: None,
            current_round: None,
        }
    }
}

/// Participant shown on the scoreboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEntity {
    /// Opaque identifier derived from the creation instant.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Current score, moved by +1/-1 admin actions.
    #[serde(default)]
    pub score: i64,
    /// Avatar path.
    #[serde(default = "default_player_icon")]
    pub icon: String,
    /// Items granted to the player, one entry per catalog item id.
    #[serde(default)]
    pub inventory: Vec<InventoryItemEntity>,
}

/// Catalog item, also copied by value into player inventories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemEntity {
    /// Opaque identifier derived from the creation instant.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Icon path.
    #[serde(default)]
    pub icon: String,
    /// Optional worth of the item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
    /// Quantity held (catalog default or player-owned count).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

fn default_tile_count() -> u32 {
    DEFAULT_TILE_COUNT
}

fn default_points_per_question() -> u32 {
    DEFAULT_POINTS_PER_QUESTION
}

fn default_player_icon() -> String {
    DEFAULT_PLAYER_ICON.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_without_questions_deserializes_empty() {
        let pool: QuestionPoolEntity =
            serde_json::from_str(r#"{"id":"1","name":"Geography"}"#).unwrap();
        assert!(pool.questions.is_empty());
    }

    #[test]
    fn round_uses_camel_case_and_defaults() {
        let round: RoundEntity = serde_json::from_str(
            r#"{"id":"r1","name":"Opening","order":2,"questionPoolId":"p1"}"#,
        )
        .unwrap();
        assert_eq!(round.order, 2);
        assert_eq!(round.question_pool_id.as_deref(), Some("p1"));
        assert_eq!(round.points_per_question, DEFAULT_POINTS_PER_QUESTION);
        assert_eq!(round.tile_count, DEFAULT_TILE_COUNT);
        assert!(round.active_questions.is_empty());

        let json = serde_json::to_value(&round).unwrap();
        assert!(json.get("activeQuestions").is_some());
        assert!(json.get("pointsPerQuestion").is_some());
    }

    #[test]
    fn question_omits_absent_optionals() {
        let question = QuestionEntity {
            id: "q".into(),
            text: "Capital of France?".into(),
            answer: "Paris".into(),
            image_url: None,
            tile_number: None,
            pool_id: Some("p".into()),
        };
        let json = serde_json::to_value(&question).unwrap();
        assert!(json.get("tileNumber").is_none());
        assert!(json.get("imageUrl").is_none());
        assert_eq!(json["poolId"], "p");
    }
}
