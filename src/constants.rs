pub const RECIPE_COUNT_PER_PAGE: i64 = 6;
pub const USER_COUNT_PER_PAGE: i64 = 6;
pub const INGREDIENT_COUNT_PER_PAGE: i64 = 100;

pub const MAX_FIELD_LENGTH: usize = 200;

pub const MIN_COOKING_TIME: i32 = 1;
pub const MAX_COOKING_TIME: i32 = 1440;
pub const MIN_INGREDIENT_AMOUNT: i32 = 1;

pub const TAG_COLORS: &[(&str, &str, &str)] = &[
    ("gray", "Gray", "#808080"),
    ("red", "Red", "#E26C2D"),
    ("orange", "Orange", "#FF8C42"),
    ("yellow", "Yellow", "#F9D648"),
    ("green", "Green", "#49B64E"),
    ("teal", "Teal", "#2AA198"),
    ("blue", "Blue", "#4A76A8"),
    ("purple", "Purple", "#8775D2"),
];

pub const MIN_COOKING_TIME_ERROR: &str = "Cooking time is below the minimum";
pub const MAX_COOKING_TIME_ERROR: &str = "Cooking time is above the maximum";
pub const MIN_INGREDIENT_AMOUNT_ERROR: &str = "Ingredient amount is below the minimum";
pub const DUPLICATE_INGREDIENT_ERROR: &str = "Recipe lists the same ingredient twice";
pub const EMPTY_INGREDIENTS_ERROR: &str = "Recipe needs at least one ingredient";
pub const EMPTY_TAGS_ERROR: &str = "Recipe needs at least one tag";
pub const SELF_FOLLOW_ERROR: &str = "You cannot subscribe to yourself";
pub const DUPLICATE_FOLLOW_ERROR: &str = "Already subscribed to this author";
pub const DUPLICATE_FAVORITE_ERROR: &str = "Recipe is already in favorites";
pub const DUPLICATE_CART_ERROR: &str = "Recipe is already in the shopping cart";
