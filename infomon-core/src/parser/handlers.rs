//! Capture-to-mutation handlers, one per shape.
//!
//! A handler returns `None` when a captured field cannot be interpreted
//! (number overflow, unknown ability name). The dispatcher then treats the
//! shape as not matching and moves on.

use regex::Captures;

use super::{BlockChange, BlockKind, Mutation};
use crate::keys::{self, FactValue};
use crate::lookup::{self, PsmCategory};

/// Rank stored for a society master.
pub const MASTER_SOCIETY_RANK: i64 = 20;

/// What a matched line produced.
#[derive(Debug)]
pub(crate) struct Hit {
    pub(crate) mutations: Vec<Mutation>,
    pub(crate) block: BlockChange,
}

impl Hit {
    pub(crate) fn facts(mutations: Vec<Mutation>) -> Self {
        Self {
            mutations,
            block: BlockChange::Keep,
        }
    }

    pub(crate) fn open(kind: BlockKind) -> Self {
        Self {
            mutations: Vec::new(),
            block: BlockChange::Open(kind),
        }
    }

    pub(crate) fn close() -> Self {
        Self {
            mutations: Vec::new(),
            block: BlockChange::Close,
        }
    }
}

/// Parse a possibly comma-grouped integer; `None` on overflow or junk.
pub(crate) fn number(text: &str) -> Option<i64> {
    let digits: String = text.chars().filter(|c| *c != ',').collect();
    digits.parse().ok()
}

fn int(caps: &Captures<'_>, name: &str) -> Option<i64> {
    number(caps.name(name)?.as_str())
}

fn text<'h>(caps: &Captures<'h>, name: &str) -> Option<&'h str> {
    caps.name(name).map(|m| m.as_str().trim())
}

pub(super) fn psm_header(caps: &Captures<'_>, _: Option<BlockKind>) -> Option<Hit> {
    let category = PsmCategory::from_narration(text(caps, "category")?)?;
    Some(Hit::open(BlockKind::Psm(category)))
}

pub(super) fn psm_row(caps: &Captures<'_>, block: Option<BlockKind>) -> Option<Hit> {
    let Some(BlockKind::Psm(category)) = block else {
        return None;
    };
    let rank = int(caps, "rank")?;
    let mnemonic = text(caps, "mnemonic")?;
    Some(Hit::facts(vec![Mutation::set(category.key(mnemonic), rank)]))
}

pub(super) fn war_cry_name(caps: &Captures<'_>, _: Option<BlockKind>) -> Option<Hit> {
    let last = text(caps, "name")?.split_whitespace().last()?;
    Some(Hit::facts(vec![Mutation::set(keys::warcry(last), 1)]))
}

pub(super) fn citizenship(caps: &Captures<'_>, _: Option<BlockKind>) -> Option<Hit> {
    let town = text(caps, "town")?;
    Some(Hit::facts(vec![Mutation::set(keys::CITIZENSHIP, town)]))
}

pub(super) fn character_name(caps: &Captures<'_>, _: Option<BlockKind>) -> Option<Hit> {
    Some(Hit::facts(vec![
        Mutation::set(keys::stat("race"), text(caps, "race")?),
        Mutation::set(keys::stat("profession"), text(caps, "profession")?),
    ]))
}

pub(super) fn character_gender(caps: &Captures<'_>, _: Option<BlockKind>) -> Option<Hit> {
    Some(Hit::facts(vec![
        Mutation::set(keys::stat("gender"), text(caps, "gender")?),
        Mutation::set(keys::stat("age"), int(caps, "age")?),
        Mutation::set(keys::stat("experience"), int(caps, "experience")?),
        Mutation::set(keys::stat("level"), int(caps, "level")?),
    ]))
}

pub(super) fn stat_row(caps: &Captures<'_>, _: Option<BlockKind>) -> Option<Hit> {
    let stat = text(caps, "stat")?;
    Some(Hit::facts(vec![
        Mutation::set(keys::stat(stat), int(caps, "value")?),
        Mutation::set(keys::stat_bonus(stat), int(caps, "bonus")?),
        Mutation::set(keys::stat_enhanced(stat), int(caps, "enhanced")?),
        Mutation::set(keys::stat_enhanced_bonus(stat), int(caps, "enhanced_bonus")?),
    ]))
}

/// Level-up rows report gains, not totals.
pub(super) fn level_up_row(caps: &Captures<'_>, _: Option<BlockKind>) -> Option<Hit> {
    let stat = text(caps, "stat")?;
    let mut mutations = vec![Mutation::delta(keys::stat(stat), int(caps, "delta")?)];
    if caps.name("bonus_delta").is_some() {
        mutations.push(Mutation::delta(
            keys::stat_bonus(stat),
            int(caps, "bonus_delta")?,
        ));
    }
    Some(Hit::facts(mutations))
}

pub(super) fn skill_row(caps: &Captures<'_>, _: Option<BlockKind>) -> Option<Hit> {
    let skill = text(caps, "skill")?;
    Some(Hit::facts(vec![
        Mutation::set(keys::skill(skill), int(caps, "ranks")?),
        Mutation::set(keys::skill_bonus(skill), int(caps, "bonus")?),
    ]))
}

pub(super) fn level_fame(caps: &Captures<'_>, _: Option<BlockKind>) -> Option<Hit> {
    Some(Hit::facts(vec![
        Mutation::set(keys::stat("level"), int(caps, "level")?),
        Mutation::set(keys::experience("fame"), int(caps, "fame")?),
    ]))
}

pub(super) fn field_experience(caps: &Captures<'_>, _: Option<BlockKind>) -> Option<Hit> {
    Some(Hit::facts(vec![
        Mutation::set(keys::stat("experience"), int(caps, "experience")?),
        Mutation::set(
            keys::experience("field_experience_current"),
            int(caps, "current")?,
        ),
        Mutation::set(keys::experience("field_experience_max"), int(caps, "max")?),
    ]))
}

pub(super) fn ascension_experience(caps: &Captures<'_>, _: Option<BlockKind>) -> Option<Hit> {
    Some(Hit::facts(vec![
        Mutation::set(
            keys::experience("ascension_experience"),
            int(caps, "ascension")?,
        ),
        Mutation::set(keys::experience("recent_deaths"), int(caps, "deaths")?),
    ]))
}

pub(super) fn total_experience(caps: &Captures<'_>, _: Option<BlockKind>) -> Option<Hit> {
    Some(Hit::facts(vec![
        Mutation::set(keys::experience("total_experience"), int(caps, "total")?),
        Mutation::set(keys::experience("deaths_sting"), text(caps, "sting")?),
    ]))
}

pub(super) fn long_term_experience(caps: &Captures<'_>, _: Option<BlockKind>) -> Option<Hit> {
    Some(Hit::facts(vec![
        Mutation::set(
            keys::experience("long_term_experience"),
            int(caps, "long_term")?,
        ),
        Mutation::set(keys::experience("deeds"), int(caps, "deeds")?),
    ]))
}

pub(super) fn until_next_level(caps: &Captures<'_>, _: Option<BlockKind>) -> Option<Hit> {
    Some(Hit::facts(vec![Mutation::set(
        keys::experience("until_next_level"),
        int(caps, "until")?,
    )]))
}

pub(super) fn resource(caps: &Captures<'_>, _: Option<BlockKind>) -> Option<Hit> {
    Some(Hit::facts(vec![
        Mutation::set(keys::resources("type"), text(caps, "kind")?),
        Mutation::set(keys::resources("weekly"), int(caps, "weekly")?),
        Mutation::set(keys::resources("total"), int(caps, "total")?),
    ]))
}

pub(super) fn suffused_resource(caps: &Captures<'_>, _: Option<BlockKind>) -> Option<Hit> {
    Some(Hit::facts(vec![Mutation::set(
        keys::resources("suffused"),
        int(caps, "suffused")?,
    )]))
}

pub(super) fn voln_favor(caps: &Captures<'_>, _: Option<BlockKind>) -> Option<Hit> {
    Some(Hit::facts(vec![Mutation::set(
        keys::resources("voln_favor"),
        int(caps, "favor")?,
    )]))
}

pub(super) fn silver(caps: &Captures<'_>, _: Option<BlockKind>) -> Option<Hit> {
    let amount = match text(caps, "silver")? {
        "no" => 0,
        n => number(n)?,
    };
    Some(Hit::facts(vec![Mutation::set(keys::currency("silver"), amount)]))
}

pub(super) fn silver_container(caps: &Captures<'_>, _: Option<BlockKind>) -> Option<Hit> {
    Some(Hit::facts(vec![Mutation::set(
        keys::currency("silver_container"),
        int(caps, "silver")?,
    )]))
}

pub(super) fn gigas_fragments(caps: &Captures<'_>, _: Option<BlockKind>) -> Option<Hit> {
    Some(Hit::facts(vec![Mutation::set(
        keys::currency("gigas_artifact_fragments"),
        int(caps, "fragments")?,
    )]))
}

pub(super) fn tickets(caps: &Captures<'_>, _: Option<BlockKind>) -> Option<Hit> {
    Some(Hit::facts(vec![Mutation::set(
        keys::currency(text(caps, "kind")?),
        int(caps, "amount")?,
    )]))
}

pub(super) fn redsteel_marks(caps: &Captures<'_>, _: Option<BlockKind>) -> Option<Hit> {
    Some(Hit::facts(vec![Mutation::set(
        keys::currency("redsteel_marks"),
        int(caps, "marks")?,
    )]))
}

fn psm_key(caps: &Captures<'_>) -> Option<String> {
    let category = PsmCategory::from_narration(text(caps, "category")?)?;
    lookup::fact_key(category, text(caps, "name")?)
}

/// Training lines that state the resulting rank outright.
pub(super) fn psm_absolute(caps: &Captures<'_>, _: Option<BlockKind>) -> Option<Hit> {
    Some(Hit::facts(vec![Mutation::set(psm_key(caps)?, int(caps, "rank")?)]))
}

/// Unlearning drops exactly one rank from whatever is stored.
pub(super) fn psm_unlearn(caps: &Captures<'_>, _: Option<BlockKind>) -> Option<Hit> {
    Some(Hit::facts(vec![Mutation::delta(psm_key(caps)?, -1)]))
}

pub(super) fn psm_lost(caps: &Captures<'_>, _: Option<BlockKind>) -> Option<Hit> {
    Some(Hit::facts(vec![Mutation::set(psm_key(caps)?, 0)]))
}

pub(super) fn society(name: &str, rank: i64) -> Hit {
    Hit::facts(vec![
        Mutation::set(keys::SOCIETY_STATUS, FactValue::from(name)),
        Mutation::set(keys::SOCIETY_RANK, rank),
    ])
}

pub(super) fn society_member(caps: &Captures<'_>, _: Option<BlockKind>) -> Option<Hit> {
    Some(society(text(caps, "society")?, int(caps, "rank")?))
}

pub(super) fn society_master(caps: &Captures<'_>, _: Option<BlockKind>) -> Option<Hit> {
    Some(society(text(caps, "society")?, MASTER_SOCIETY_RANK))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_accept_grouping() {
        assert_eq!(number("4,804,958"), Some(4_804_958));
        assert_eq!(number("0"), Some(0));
        assert_eq!(number("-35"), Some(-35));
        assert_eq!(number("99,999,999,999,999,999,999"), None);
        assert_eq!(number("none"), None);
    }
}
