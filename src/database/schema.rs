use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::TypeError;
use crate::constants::TAG_COLORS;

pub type Id = i32;

#[derive(
    Clone, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Eq, Ord, Hash, Deserialize,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

impl TryFrom<Value> for UserRole {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value.as_str() {
            Some(value) => match value {
                "user" => Ok(Self::User),
                "admin" => Ok(Self::Admin),
                _ => Err(TypeError::new("Invalid variant")),
            },
            None => Err(TypeError::new("Failed to parse value as string")),
        }
    }
}

#[derive(
    Clone, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Deserialize, Eq, Ord, Hash,
)]
#[sqlx(type_name = "tag_color", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TagColor {
    Gray,
    Red,
    Orange,
    Yellow,
    Green,
    Teal,
    Blue,
    Purple,
}

impl TagColor {
    fn key(&self) -> &'static str {
        match self {
            TagColor::Gray => "gray",
            TagColor::Red => "red",
            TagColor::Orange => "orange",
            TagColor::Yellow => "yellow",
            TagColor::Green => "green",
            TagColor::Teal => "teal",
            TagColor::Blue => "blue",
            TagColor::Purple => "purple",
        }
    }

    /// Hex code shipped to clients, resolved from the palette table.
    pub fn hex(&self) -> &'static str {
        let key = self.key();
        TAG_COLORS
            .iter()
            .find(|(name, _, _)| *name == key)
            .map(|(_, _, hex)| *hex)
            .unwrap_or("#808080")
    }
}

impl TryFrom<Value> for TagColor {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value.as_str() {
            Some(value) => match value {
                "gray" => Ok(Self::Gray),
                "red" => Ok(Self::Red),
                "orange" => Ok(Self::Orange),
                "yellow" => Ok(Self::Yellow),
                "green" => Ok(Self::Green),
                "teal" => Ok(Self::Teal),
                "blue" => Ok(Self::Blue),
                "purple" => Ok(Self::Purple),
                _ => Err(TypeError::new("Invalid variant")),
            },
            None => Err(TypeError::new("Failed to parse value as string")),
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct User {
    pub id: Id,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub role: UserRole,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct UserListRow {
    pub id: Id,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,

    pub count: i64,
}

impl From<UserListRow> for UserProfile {
    fn from(row: UserListRow) -> Self {
        Self {
            email: row.email,
            id: row.id,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            is_subscribed: row.is_subscribed,
        }
    }
}

/// Public profile shape. `is_subscribed` is resolved against the viewer.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub email: String,
    pub id: Id,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Tag {
    pub id: Id,
    pub name: String,
    pub color: TagColor,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagPayload {
    pub id: Id,
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl From<Tag> for TagPayload {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
            color: tag.color.hex().to_string(),
            slug: tag.slug,
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Ingredient {
    pub id: Id,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct IngredientRow {
    pub id: Id,
    pub name: String,
    pub measurement_unit: String,

    pub count: i64,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: Id,
    pub author_id: Id,
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i32,
    pub pub_date: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct RecipeRow {
    pub id: Id,
    pub author_id: Id,
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i32,
    pub pub_date: DateTime<Utc>,

    pub count: i64,
}

impl From<RecipeRow> for Recipe {
    fn from(row: RecipeRow) -> Self {
        Self {
            id: row.id,
            author_id: row.author_id,
            name: row.name,
            image: row.image,
            text: row.text,
            cooking_time: row.cooking_time,
            pub_date: row.pub_date,
        }
    }
}

/// Quantity-bearing join row, resolved against the ingredient it names.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeIngredient {
    pub recipe_id: Id,
    pub ingredient_id: Id,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngredientAmount {
    pub id: Id,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl From<RecipeIngredient> for IngredientAmount {
    fn from(part: RecipeIngredient) -> Self {
        Self {
            id: part.ingredient_id,
            name: part.name,
            measurement_unit: part.measurement_unit,
            amount: part.amount,
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeShort {
    pub id: Id,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: i32,
}

impl From<Recipe> for RecipeShort {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            image: recipe.image,
            cooking_time: recipe.cooking_time,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetail {
    pub id: Id,
    pub tags: Vec<TagPayload>,
    pub author: UserProfile,
    pub ingredients: Vec<IngredientAmount>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionEntry {
    pub email: String,
    pub id: Id,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub recipes: Vec<RecipeShort>,
    pub recipes_count: i64,
}

/// One line of the aggregated shopping list: amounts summed per
/// (ingredient name, measurement unit) across every recipe in the cart.
#[derive(sqlx::FromRow, Debug, Clone, Serialize, PartialEq)]
pub struct ShoppingListRow {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

#[derive(Debug, Default, Clone)]
pub struct RecipeFilter {
    pub author: Option<Id>,
    pub tags: Vec<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecipeIngredientPayload {
    pub id: Id,
    pub amount: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecipePayload {
    pub ingredients: Vec<RecipeIngredientPayload>,
    pub tags: Vec<Id>,
    pub image: Option<String>,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tag_color_maps_to_palette_hex() {
        assert_eq!(TagColor::Red.hex(), "#E26C2D");
        assert_eq!(TagColor::Gray.hex(), "#808080");
    }

    #[test]
    fn tag_color_parses_from_value() {
        assert_eq!(TagColor::try_from(json!("teal")).unwrap(), TagColor::Teal);
        assert!(TagColor::try_from(json!("mauve")).is_err());
        assert!(TagColor::try_from(json!(7)).is_err());
    }

    #[test]
    fn user_role_parses_from_value() {
        assert_eq!(UserRole::try_from(json!("admin")).unwrap(), UserRole::Admin);
        assert!(UserRole::try_from(json!("creator")).is_err());
    }

    #[test]
    fn tag_payload_carries_hex() {
        let tag = Tag {
            id: 1,
            name: "Breakfast".to_string(),
            color: TagColor::Yellow,
            slug: "breakfast".to_string(),
        };
        let payload = TagPayload::from(tag);
        assert_eq!(payload.color, "#F9D648");
    }
}
