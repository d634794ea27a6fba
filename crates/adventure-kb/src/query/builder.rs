//! Builds parameterised Cypher traversals for every domain operation.
//!
//! Statement text is assembled only from the constants in [`crate::schema`].
//! Names, scores, dates and ids supplied by callers are always bound as
//! parameters, never spliced into the statement.

use chrono::{NaiveDate, Utc};

use crate::bonus;
use crate::data::entities::validate_score;
use crate::data::{AttributeId, BaseScores, CharacterId, CompletionId, CoreError, HabitId};
use crate::query::traversal::{Traversal, TraversalOp};
use crate::schema::{attribute, character, column, completion, edge, habit, label, AttributeKind};

/// Calendar dates are stored as ISO strings so they compare lexicographically.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parameter names shared by the builder and by stores that interpret
/// traversals without parsing the statement.
pub mod param {
    use crate::schema::AttributeKind;

    pub const CHARACTER_ID: &str = "character_id";
    pub const NAME: &str = "name";
    pub const CREATED_AT: &str = "created_at";
    pub const MAX_HP: &str = "max_hp";
    pub const ATTRIBUTE_ID: &str = "attribute_id";
    pub const ATTRIBUTE_NAME: &str = "attribute_name";
    pub const BASE_SCORE: &str = "base_score";
    pub const HABIT_ID: &str = "habit_id";
    pub const DESCRIPTION: &str = "description";
    pub const POINTS: &str = "points";
    pub const COMPLETION_ID: &str = "completion_id";
    pub const DATE: &str = "completion_date";
    pub const FROM: &str = "from";
    pub const TO: &str = "to";
    pub const DELTA: &str = "delta";

    /// Id parameter for one of the six attributes created with a character.
    pub fn attribute_id(kind: AttributeKind) -> String {
        format!("{}_attribute_id", kind)
    }

    /// Base score parameter for one of the six attributes created with a character.
    pub fn base_score(kind: AttributeKind) -> String {
        format!("{}_base_score", kind)
    }
}

/// Columns returned by every traversal that hydrates whole characters.
pub const CHARACTER_COLUMNS: [&str; 14] = [
    column::CHARACTER_ID,
    column::CHARACTER_NAME,
    column::CHARACTER_CREATED_AT,
    column::MAX_HP,
    column::CURRENT_HP,
    column::ATTRIBUTE_ID,
    column::ATTRIBUTE_NAME,
    column::BASE_SCORE,
    column::HABIT_ID,
    column::HABIT_NAME,
    column::HABIT_DESCRIPTION,
    column::POINTS,
    column::HABIT_CREATED_AT,
    column::COMPLETION_COUNT,
];

/// Columns returned by every traversal that hydrates a single habit.
pub const HABIT_COLUMNS: [&str; 7] = [
    column::ATTRIBUTE_ID,
    column::HABIT_ID,
    column::HABIT_NAME,
    column::HABIT_DESCRIPTION,
    column::POINTS,
    column::HABIT_CREATED_AT,
    column::COMPLETION_COUNT,
];

/// Entry point for building traversals.
pub struct TraversalBuilder;

impl TraversalBuilder {
    /// Creates the character, its six attributes and the six ownership edges
    /// in a single statement, then returns the new character's rows.
    pub fn create_character(name: &str, scores: BaseScores) -> Result<Traversal, CoreError> {
        let name = require_name("Character name", name)?;
        scores.validate()?;

        let mut statement = format!(
            "CREATE (c:{character} {{{id}: ${p_id}, {name}: ${p_name}, {created}: ${p_created}, {max_hp}: ${p_max_hp}, {current_hp}: ${p_max_hp}}})\n",
            character = label::CHARACTER,
            id = character::ID,
            name = character::NAME,
            created = character::CREATED_AT,
            max_hp = character::MAX_HP,
            current_hp = character::CURRENT_HP,
            p_id = param::CHARACTER_ID,
            p_name = param::NAME,
            p_created = param::CREATED_AT,
            p_max_hp = param::MAX_HP,
        );
        for kind in AttributeKind::ALL {
            statement.push_str(&format!(
                "CREATE (c)-[:{has}]->(:{attribute} {{{id}: ${p_id}, {owner}: ${p_owner}, {name}: '{kind}', {base}: ${p_base}}})\n",
                has = edge::HAS_ATTRIBUTE,
                attribute = label::ATTRIBUTE,
                id = attribute::ID,
                owner = attribute::CHARACTER_ID,
                name = attribute::NAME,
                kind = kind.as_str(),
                base = attribute::BASE_SCORE,
                p_id = param::attribute_id(kind),
                p_owner = param::CHARACTER_ID,
                p_base = param::base_score(kind),
            ));
        }
        statement.push_str(&format!(
            "WITH c\nMATCH (c)-[:{has}]->(a:{attribute})\nRETURN {projection}",
            has = edge::HAS_ATTRIBUTE,
            attribute = label::ATTRIBUTE,
            projection = character_projection(false),
        ));

        let character_id = CharacterId::new_v4();
        let mut traversal = Traversal::new(TraversalOp::CreateCharacter, statement)
            .param(param::CHARACTER_ID, character_id.to_string())
            .param(param::NAME, name)
            .param(param::CREATED_AT, Utc::now().to_rfc3339())
            .param(param::MAX_HP, bonus::max_hit_points(scores.constitution));
        for (kind, score) in scores.iter() {
            traversal = traversal
                .param(param::attribute_id(kind), AttributeId::new_v4().to_string())
                .param(param::base_score(kind), score);
        }

        Ok(traversal.returning(&CHARACTER_COLUMNS))
    }

    pub fn get_character(character_id: CharacterId) -> Result<Traversal, CoreError> {
        let statement = format!(
            "MATCH (c:{character} {{{id}: ${p_id}}})\n{tree}\nRETURN {projection}\nORDER BY {attr_name}, {habit_name}",
            character = label::CHARACTER,
            id = character::ID,
            p_id = param::CHARACTER_ID,
            tree = character_tree(),
            projection = character_projection(true),
            attr_name = column::ATTRIBUTE_NAME,
            habit_name = column::HABIT_NAME,
        );

        Ok(Traversal::new(TraversalOp::GetCharacter, statement)
            .param(param::CHARACTER_ID, character_id.to_string())
            .returning(&CHARACTER_COLUMNS))
    }

    pub fn list_characters() -> Result<Traversal, CoreError> {
        let statement = format!(
            "MATCH (c:{character})\n{tree}\nRETURN {projection}\nORDER BY {created}, {id}, {attr_name}, {habit_name}",
            character = label::CHARACTER,
            tree = character_tree(),
            projection = character_projection(true),
            created = column::CHARACTER_CREATED_AT,
            id = column::CHARACTER_ID,
            attr_name = column::ATTRIBUTE_NAME,
            habit_name = column::HABIT_NAME,
        );

        Ok(Traversal::new(TraversalOp::ListCharacters, statement).returning(&CHARACTER_COLUMNS))
    }

    /// Sets the base score of one attribute, located by owner and name.
    /// Returns no rows when the character does not exist.
    pub fn update_attribute_score(
        character_id: CharacterId,
        attribute_name: &str,
        score: i64,
    ) -> Result<Traversal, CoreError> {
        let kind: AttributeKind = attribute_name.parse()?;
        validate_score(kind, score)?;

        let statement = format!(
            "MATCH (c:{character} {{{cid}: ${p_cid}}})-[:{has}]->(a:{attribute} {{{name}: ${p_name}}})\nSET a.{base} = ${p_base}\nRETURN a.{aid} AS {col_aid}",
            character = label::CHARACTER,
            cid = character::ID,
            p_cid = param::CHARACTER_ID,
            has = edge::HAS_ATTRIBUTE,
            attribute = label::ATTRIBUTE,
            name = attribute::NAME,
            p_name = param::ATTRIBUTE_NAME,
            base = attribute::BASE_SCORE,
            p_base = param::BASE_SCORE,
            aid = attribute::ID,
            col_aid = column::ATTRIBUTE_ID,
        );

        Ok(Traversal::new(TraversalOp::UpdateAttributeScore, statement)
            .param(param::CHARACTER_ID, character_id.to_string())
            .param(param::ATTRIBUTE_NAME, kind.as_str())
            .param(param::BASE_SCORE, score)
            .returning(&[column::ATTRIBUTE_ID]))
    }

    /// Removes the character with everything it owns in one statement.
    /// Returns no rows when the character does not exist.
    pub fn delete_character(character_id: CharacterId) -> Result<Traversal, CoreError> {
        let statement = format!(
            "MATCH (c:{character} {{{id}: ${p_id}}})\n{tree_without_count}\nWITH c, c.{id} AS {col_id}, collect(DISTINCT a) + collect(DISTINCT h) + collect(DISTINCT x) AS owned\nFOREACH (n IN owned | DETACH DELETE n)\nDETACH DELETE c\nRETURN {col_id}, size(owned) AS {removed}",
            character = label::CHARACTER,
            id = character::ID,
            p_id = param::CHARACTER_ID,
            tree_without_count = optional_tree_matches(),
            col_id = column::CHARACTER_ID,
            removed = column::REMOVED,
        );

        Ok(Traversal::new(TraversalOp::DeleteCharacter, statement)
            .param(param::CHARACTER_ID, character_id.to_string())
            .returning(&[column::CHARACTER_ID, column::REMOVED]))
    }

    /// Reads one attribute together with its owning character's header,
    /// using the same columns as [`TraversalBuilder::get_character`].
    pub fn get_attribute(attribute_id: AttributeId) -> Result<Traversal, CoreError> {
        let statement = format!(
            "MATCH (c:{character})-[:{has_attr}]->(a:{attribute} {{{aid}: ${p_aid}}})\nOPTIONAL MATCH (a)-[:{has_habit}]->(h:{habit})\nOPTIONAL MATCH (h)-[:{has_completion}]->(x:{completion})\nWITH c, a, h, count(x) AS {count}\nRETURN {projection}\nORDER BY {habit_name}",
            character = label::CHARACTER,
            has_attr = edge::HAS_ATTRIBUTE,
            attribute = label::ATTRIBUTE,
            aid = attribute::ID,
            p_aid = param::ATTRIBUTE_ID,
            has_habit = edge::HAS_HABIT,
            habit = label::HABIT,
            has_completion = edge::HAS_COMPLETION,
            completion = label::COMPLETION,
            count = column::COMPLETION_COUNT,
            projection = character_projection(true),
            habit_name = column::HABIT_NAME,
        );

        Ok(Traversal::new(TraversalOp::GetAttribute, statement)
            .param(param::ATTRIBUTE_ID, attribute_id.to_string())
            .returning(&CHARACTER_COLUMNS))
    }

    /// Attaches a new habit to an attribute. Returns no rows when the
    /// attribute does not exist.
    pub fn create_habit(
        attribute_id: AttributeId,
        name: &str,
        points_per_completion: i64,
        description: &str,
    ) -> Result<Traversal, CoreError> {
        let name = require_name("Habit name", name)?;
        if points_per_completion <= 0 {
            return Err(CoreError::ValidationError(format!(
                "Points per completion must be positive (got {})",
                points_per_completion
            )));
        }

        let statement = format!(
            "MATCH (a:{attribute} {{{aid}: ${p_aid}}})\nCREATE (a)-[:{has}]->(h:{habit} {{{hid}: ${p_hid}, {owner}: ${p_aid}, {name}: ${p_name}, {desc}: ${p_desc}, {points}: ${p_points}, {created}: ${p_created}}})\nWITH a, h, 0 AS {count}\nRETURN {projection}",
            attribute = label::ATTRIBUTE,
            aid = attribute::ID,
            p_aid = param::ATTRIBUTE_ID,
            has = edge::HAS_HABIT,
            habit = label::HABIT,
            hid = habit::ID,
            p_hid = param::HABIT_ID,
            owner = habit::ATTRIBUTE_ID,
            name = habit::NAME,
            p_name = param::NAME,
            desc = habit::DESCRIPTION,
            p_desc = param::DESCRIPTION,
            points = habit::POINTS,
            p_points = param::POINTS,
            created = habit::CREATED_AT,
            p_created = param::CREATED_AT,
            count = column::COMPLETION_COUNT,
            projection = habit_projection(),
        );

        Ok(Traversal::new(TraversalOp::CreateHabit, statement)
            .param(param::ATTRIBUTE_ID, attribute_id.to_string())
            .param(param::HABIT_ID, HabitId::new_v4().to_string())
            .param(param::NAME, name)
            .param(param::DESCRIPTION, description.trim())
            .param(param::POINTS, points_per_completion)
            .param(param::CREATED_AT, Utc::now().to_rfc3339())
            .returning(&HABIT_COLUMNS))
    }

    pub fn get_habit(habit_id: HabitId) -> Result<Traversal, CoreError> {
        let statement = format!(
            "{owned_habit}\nOPTIONAL MATCH (h)-[:{has}]->(x:{completion})\nWITH a, h, count(x) AS {count}\nRETURN {projection}",
            owned_habit = match_owned_habit(),
            has = edge::HAS_COMPLETION,
            completion = label::COMPLETION,
            count = column::COMPLETION_COUNT,
            projection = habit_projection(),
        );

        Ok(Traversal::new(TraversalOp::GetHabit, statement)
            .param(param::HABIT_ID, habit_id.to_string())
            .returning(&HABIT_COLUMNS))
    }

    /// Removes the habit and its completions. Returns no rows when the habit
    /// does not exist.
    pub fn delete_habit(habit_id: HabitId) -> Result<Traversal, CoreError> {
        let statement = format!(
            "MATCH (h:{habit} {{{hid}: ${p_hid}}})\nOPTIONAL MATCH (h)-[:{has}]->(x:{completion})\nWITH h, h.{hid} AS {col_hid}, collect(x) AS owned\nFOREACH (n IN owned | DETACH DELETE n)\nDETACH DELETE h\nRETURN {col_hid}, size(owned) AS {removed}",
            habit = label::HABIT,
            hid = habit::ID,
            p_hid = param::HABIT_ID,
            has = edge::HAS_COMPLETION,
            completion = label::COMPLETION,
            col_hid = column::HABIT_ID,
            removed = column::REMOVED,
        );

        Ok(Traversal::new(TraversalOp::DeleteHabit, statement)
            .param(param::HABIT_ID, habit_id.to_string())
            .returning(&[column::HABIT_ID, column::REMOVED]))
    }

    /// Marks a habit done for `date`. Merging on `(habit, date)` makes a
    /// second call for the same day a no-op; the returned completion id then
    /// differs from the one bound in the parameters.
    pub fn record_completion(habit_id: HabitId, date: NaiveDate) -> Result<Traversal, CoreError> {
        let statement = format!(
            "{owned_habit}\nMERGE (x:{completion} {{{owner}: ${p_hid}, {date}: ${p_date}}})\nON CREATE SET x.{cid} = ${p_cid}, x.{created} = ${p_created}\nMERGE (h)-[:{has}]->(x)\nWITH a, h, x\nMATCH (h)-[:{has}]->(done:{completion})\nWITH a, h, x, count(done) AS {count}\nRETURN {projection}, x.{cid} AS {col_cid}, x.{date} AS {col_date}",
            owned_habit = match_owned_habit(),
            has = edge::HAS_COMPLETION,
            completion = label::COMPLETION,
            owner = completion::HABIT_ID,
            p_hid = param::HABIT_ID,
            date = completion::DATE,
            p_date = param::DATE,
            cid = completion::ID,
            p_cid = param::COMPLETION_ID,
            created = completion::CREATED_AT,
            p_created = param::CREATED_AT,
            count = column::COMPLETION_COUNT,
            projection = habit_projection(),
            col_cid = column::COMPLETION_ID,
            col_date = column::COMPLETION_DATE,
        );

        let mut columns = HABIT_COLUMNS.to_vec();
        columns.extend([column::COMPLETION_ID, column::COMPLETION_DATE]);

        Ok(Traversal::new(TraversalOp::RecordCompletion, statement)
            .param(param::HABIT_ID, habit_id.to_string())
            .param(param::DATE, format_date(date))
            .param(param::COMPLETION_ID, CompletionId::new_v4().to_string())
            .param(param::CREATED_AT, Utc::now().to_rfc3339())
            .returning(&columns))
    }

    /// Un-marks a habit for `date`. Removing a day that was never recorded
    /// is not an error; the `removed` column is then 0.
    pub fn remove_completion(habit_id: HabitId, date: NaiveDate) -> Result<Traversal, CoreError> {
        let statement = format!(
            "{owned_habit}\nOPTIONAL MATCH (h)-[:{has}]->(x:{completion} {{{date}: ${p_date}}})\nWITH a, h, collect(x) AS matched\nFOREACH (n IN matched | DETACH DELETE n)\nWITH a, h, size(matched) AS {removed}\nOPTIONAL MATCH (h)-[:{has}]->(rest:{completion})\nWITH a, h, {removed}, count(rest) AS {count}\nRETURN {projection}, {removed}",
            owned_habit = match_owned_habit(),
            has = edge::HAS_COMPLETION,
            completion = label::COMPLETION,
            date = completion::DATE,
            p_date = param::DATE,
            removed = column::REMOVED,
            count = column::COMPLETION_COUNT,
            projection = habit_projection(),
        );

        let mut columns = HABIT_COLUMNS.to_vec();
        columns.push(column::REMOVED);

        Ok(Traversal::new(TraversalOp::RemoveCompletion, statement)
            .param(param::HABIT_ID, habit_id.to_string())
            .param(param::DATE, format_date(date))
            .returning(&columns))
    }

    /// Completions of every habit of a character with `from <= date <= to`.
    ///
    /// Always yields at least one row for an existing character; rows with a
    /// null completion id only prove the character exists.
    pub fn completions_between(
        character_id: CharacterId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Traversal, CoreError> {
        if from > to {
            return Err(CoreError::ValidationError(format!(
                "Date range start {} is after its end {}",
                from, to
            )));
        }

        let statement = format!(
            "MATCH (c:{character} {{{id}: ${p_id}}})\nOPTIONAL MATCH (c)-[:{has_attr}]->(:{attribute})-[:{has_habit}]->(h:{habit})-[:{has_completion}]->(x:{completion})\nWHERE x.{date} >= ${p_from} AND x.{date} <= ${p_to}\nRETURN c.{id} AS {col_id}, h.{hid} AS {col_hid}, x.{cid} AS {col_cid}, x.{date} AS {col_date}\nORDER BY {col_date}, {col_hid}",
            character = label::CHARACTER,
            id = character::ID,
            p_id = param::CHARACTER_ID,
            has_attr = edge::HAS_ATTRIBUTE,
            attribute = label::ATTRIBUTE,
            has_habit = edge::HAS_HABIT,
            habit = label::HABIT,
            has_completion = edge::HAS_COMPLETION,
            completion = label::COMPLETION,
            date = completion::DATE,
            p_from = param::FROM,
            p_to = param::TO,
            hid = habit::ID,
            cid = completion::ID,
            col_id = column::CHARACTER_ID,
            col_hid = column::HABIT_ID,
            col_cid = column::COMPLETION_ID,
            col_date = column::COMPLETION_DATE,
        );

        Ok(Traversal::new(TraversalOp::CompletionsBetween, statement)
            .param(param::CHARACTER_ID, character_id.to_string())
            .param(param::FROM, format_date(from))
            .param(param::TO, format_date(to))
            .returning(&[
                column::CHARACTER_ID,
                column::HABIT_ID,
                column::COMPLETION_ID,
                column::COMPLETION_DATE,
            ]))
    }

    /// Applies damage (negative) or healing (positive), clamped to `[0, max_hp]`.
    /// Characters without stored hit points start from full base hit points,
    /// and both values are written back.
    pub fn adjust_hit_points(character_id: CharacterId, delta: i64) -> Result<Traversal, CoreError> {
        let statement = format!(
            "MATCH (c:{character} {{{id}: ${p_id}}})\nWITH c, coalesce(c.{max}, {base_hp}) AS cap\nWITH c, cap, coalesce(c.{current}, cap) + ${p_delta} AS target\nSET c.{max} = cap, c.{current} = CASE WHEN target < 0 THEN 0 WHEN target > cap THEN cap ELSE target END\nRETURN c.{id} AS {col_id}, c.{current} AS {col_current}, c.{max} AS {col_max}",
            character = label::CHARACTER,
            id = character::ID,
            p_id = param::CHARACTER_ID,
            current = character::CURRENT_HP,
            max = character::MAX_HP,
            p_delta = param::DELTA,
            base_hp = bonus::BASE_HIT_POINTS,
            col_id = column::CHARACTER_ID,
            col_current = column::CURRENT_HP,
            col_max = column::MAX_HP,
        );

        Ok(Traversal::new(TraversalOp::AdjustHitPoints, statement)
            .param(param::CHARACTER_ID, character_id.to_string())
            .param(param::DELTA, delta)
            .returning(&[column::CHARACTER_ID, column::CURRENT_HP, column::MAX_HP]))
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

fn require_name(what: &str, name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::ValidationError(format!("{} must not be empty", what)));
    }
    Ok(trimmed.to_string())
}

/// `MATCH` of an attribute-owned habit bound to `a` and `h`.
fn match_owned_habit() -> String {
    format!(
        "MATCH (a:{attribute})-[:{has}]->(h:{habit} {{{hid}: ${p_hid}}})",
        attribute = label::ATTRIBUTE,
        has = edge::HAS_HABIT,
        habit = label::HABIT,
        hid = habit::ID,
        p_hid = param::HABIT_ID,
    )
}

/// The three optional hops below a character bound to `c`.
fn optional_tree_matches() -> String {
    format!(
        "OPTIONAL MATCH (c)-[:{has_attr}]->(a:{attribute})\nOPTIONAL MATCH (a)-[:{has_habit}]->(h:{habit})\nOPTIONAL MATCH (h)-[:{has_completion}]->(x:{completion})",
        has_attr = edge::HAS_ATTRIBUTE,
        attribute = label::ATTRIBUTE,
        has_habit = edge::HAS_HABIT,
        habit = label::HABIT,
        has_completion = edge::HAS_COMPLETION,
        completion = label::COMPLETION,
    )
}

/// Optional hops plus a per-habit completion count.
fn character_tree() -> String {
    format!(
        "{}\nWITH c, a, h, count(x) AS {}",
        optional_tree_matches(),
        column::COMPLETION_COUNT
    )
}

/// `RETURN` body for [`CHARACTER_COLUMNS`]. Without habits, the habit
/// columns are null and the count is zero.
fn character_projection(with_habits: bool) -> String {
    let habit_expr = |property: &str| {
        if with_habits {
            format!("h.{}", property)
        } else {
            "null".to_string()
        }
    };
    let count_expr = if with_habits {
        column::COMPLETION_COUNT.to_string()
    } else {
        "0".to_string()
    };

    let fields = [
        (format!("c.{}", character::ID), column::CHARACTER_ID),
        (format!("c.{}", character::NAME), column::CHARACTER_NAME),
        (format!("c.{}", character::CREATED_AT), column::CHARACTER_CREATED_AT),
        (format!("c.{}", character::MAX_HP), column::MAX_HP),
        (format!("c.{}", character::CURRENT_HP), column::CURRENT_HP),
        (format!("a.{}", attribute::ID), column::ATTRIBUTE_ID),
        (format!("a.{}", attribute::NAME), column::ATTRIBUTE_NAME),
        (format!("a.{}", attribute::BASE_SCORE), column::BASE_SCORE),
        (habit_expr(habit::ID), column::HABIT_ID),
        (habit_expr(habit::NAME), column::HABIT_NAME),
        (habit_expr(habit::DESCRIPTION), column::HABIT_DESCRIPTION),
        (habit_expr(habit::POINTS), column::POINTS),
        (habit_expr(habit::CREATED_AT), column::HABIT_CREATED_AT),
        (count_expr, column::COMPLETION_COUNT),
    ];
    render_fields(&fields)
}

/// `RETURN` body for [`HABIT_COLUMNS`], with `a`, `h` and the count bound.
fn habit_projection() -> String {
    let fields = [
        (format!("a.{}", attribute::ID), column::ATTRIBUTE_ID),
        (format!("h.{}", habit::ID), column::HABIT_ID),
        (format!("h.{}", habit::NAME), column::HABIT_NAME),
        (format!("h.{}", habit::DESCRIPTION), column::HABIT_DESCRIPTION),
        (format!("h.{}", habit::POINTS), column::POINTS),
        (format!("h.{}", habit::CREATED_AT), column::HABIT_CREATED_AT),
        (column::COMPLETION_COUNT.to_string(), column::COMPLETION_COUNT),
    ];
    render_fields(&fields)
}

fn render_fields(fields: &[(String, &'static str)]) -> String {
    fields
        .iter()
        .map(|(expr, alias)| {
            if expr == alias {
                expr.clone()
            } else {
                format!("{} AS {}", expr, alias)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
