//! The ordered shape catalogue.
//!
//! Block-scoped shapes come first: they are the most specific and only
//! apply while their listing is open. Always-on shapes follow. Within each
//! group the order only matters where two patterns could claim the same
//! line, and none currently can.

use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::handlers::{self, Hit};
use super::BlockKind;
use crate::keys;
use crate::parser::Mutation;
use crate::status::StatusEffect;

/// Identifies a line shape. Stable across releases; used in logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeId {
    /// Row of a PSM table.
    PsmRow,
    /// Name inside the war cry list.
    WarCryName,
    /// Header of a PSM table.
    PsmHeader,
    /// Header of the war cry list.
    WarCryHeader,
    /// Filter footer closing a PSM table.
    ListingFooter,
    /// `You currently have ... citizenship in <Town>.`
    Citizenship,
    /// `You don't seem to have citizenship.`
    NoCitizenship,
    /// `Name: ... Race: ... Profession: ...`
    CharacterName,
    /// `Gender: ... Age: ... Expr: ... Level: ...`
    CharacterGender,
    /// Stat sheet row with enhanced values.
    StatRow,
    /// Level-up gain row.
    LevelUpRow,
    /// `<Skill>.....|  <bonus>  <ranks>` row of the skill table.
    SkillRow,
    /// `Level: / Fame:`
    LevelFame,
    /// `Experience: / Field Exp:`
    FieldExperience,
    /// `Ascension Exp: / Recent Deaths:`
    AscensionExperience,
    /// `Total Exp: / Death's Sting:`
    TotalExperience,
    /// `Long-Term Exp: / Deeds:`
    LongTermExperience,
    /// `Exp until lvl:`
    UntilNextLevel,
    /// Weekly/total profession resource.
    Resource,
    /// `Suffused <Type>:`
    SuffusedResource,
    /// `Voln Favor:`
    VolnFavor,
    /// Silver on hand.
    Silver,
    /// Silver in the coin pouch.
    SilverContainer,
    /// Gigas artifact fragments.
    GigasFragments,
    /// Event ticket balance.
    Tickets,
    /// `Redsteel Marks:`
    RedsteelMarks,
    /// `You have now achieved rank ...`
    LearnPsm,
    /// `[You have gained rank ...]`
    GainTechnique,
    /// `[You have increased|decreased to rank ...]`
    ChangeTechnique,
    /// `You decide to unlearn rank ...`
    UnlearnPsm,
    /// `[You are no longer trained in ...]`
    LostTechnique,
    /// Not in a society.
    SocietyNone,
    /// Member at a step or rank.
    SocietyMember,
    /// Master of a society.
    SocietyMaster,
    /// Grandmaster welcome.
    SocietyJoin,
    /// Grandmaster enrolment.
    SocietyEnroll,
    /// Grandmaster resignation.
    SocietyResign,
    /// Narration that starts an effect.
    StatusOnset(StatusEffect),
    /// Narration that ends an effect.
    StatusClear(StatusEffect),
}

/// Listing family a block-scoped shape belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockFamily {
    /// Any PSM table.
    Psm,
    /// The war cry list.
    WarCries,
}

impl BlockKind {
    /// Family of this block.
    #[must_use]
    pub fn family(self) -> BlockFamily {
        match self {
            Self::Psm(_) => BlockFamily::Psm,
            Self::WarCries => BlockFamily::WarCries,
        }
    }
}

/// When a shape is eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// On every line.
    Always,
    /// Only while a block of this family is open.
    InBlock(BlockFamily),
}

impl Scope {
    /// Whether a shape with this scope may run under `block`.
    #[must_use]
    pub fn admits(self, block: Option<BlockKind>) -> bool {
        match self {
            Self::Always => true,
            Self::InBlock(family) => block.is_some_and(|b| b.family() == family),
        }
    }
}

type Handler = Box<dyn Fn(&Captures<'_>, Option<BlockKind>) -> Option<Hit> + Send + Sync>;

/// One catalogue entry.
pub struct Matcher {
    /// Shape tag.
    pub shape: ShapeId,
    /// Eligibility.
    pub scope: Scope,
    pub(crate) pattern: Regex,
    pub(crate) handler: Handler,
}

impl Matcher {
    fn new<F>(shape: ShapeId, scope: Scope, pattern: &str, handler: F) -> Self
    where
        F: Fn(&Captures<'_>, Option<BlockKind>) -> Option<Hit> + Send + Sync + 'static,
    {
        Self {
            shape,
            scope,
            pattern: Regex::new(pattern).expect("catalogue pattern must compile"),
            handler: Box::new(handler),
        }
    }

    fn always<F>(shape: ShapeId, pattern: &str, handler: F) -> Self
    where
        F: Fn(&Captures<'_>, Option<BlockKind>) -> Option<Hit> + Send + Sync + 'static,
    {
        Self::new(shape, Scope::Always, pattern, handler)
    }

    fn status(effect: StatusEffect, active: bool, pattern: &str) -> Self {
        let shape = if active {
            ShapeId::StatusOnset(effect)
        } else {
            ShapeId::StatusClear(effect)
        };
        Self::always(shape, pattern, move |_, _| {
            Some(Hit::facts(vec![Mutation::set(effect.fact_key(), active)]))
        })
    }

    /// The pattern source.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher")
            .field("shape", &self.shape)
            .field("scope", &self.scope)
            .field("pattern", &self.pattern.as_str())
            .finish_non_exhaustive()
    }
}

const PSM_PLURAL: &str = "Ascension Abilities|Armor Specializations|Combat Maneuvers|Feats|Shield Specializations|Weapon Techniques";
const PSM_SINGULAR: &str =
    "Armor Specialization|Combat Maneuver|Feat|Shield Specialization|Weapon Technique";
const RESOURCE_TYPES: &str = "Essence|Necrotic Energy|Lore Knowledge|Motes of Tranquility|Devotion|Nature's Grace|Grit|Luck Inspiration|Guile|Vitality";
const SOCIETIES: &str = "Order of Voln|Council of Light|Guardians of Sunfist";
const TICKET_VENUES: &str =
    "General|Troubled Waters|Duskruin Arena|Reim|Ebon Gate|Rumor Woods";
const TICKET_KINDS: &str = "tickets|blackscrip|bloodscrip|ethereal scrip|soul shards|raikhen";
const NUM: &str = r"[\d,]+";

static CATALOGUE: LazyLock<Vec<Matcher>> = LazyLock::new(build);

/// The catalogue, in dispatch order.
pub fn catalogue() -> &'static [Matcher] {
    &CATALOGUE
}

#[allow(clippy::too_many_lines)]
fn build() -> Vec<Matcher> {
    use ShapeId as S;
    use StatusEffect as E;

    vec![
        // Block-scoped.
        Matcher::new(
            S::PsmRow,
            Scope::InBlock(BlockFamily::Psm),
            r"^\s+(?<name>[A-Za-z][A-Za-z' \-]*?)\s+(?<mnemonic>[a-z]+)\s+(?<rank>\d+)/(?<max>\d+)(?:\s.*)?$",
            handlers::psm_row,
        ),
        Matcher::new(
            S::WarCryName,
            Scope::InBlock(BlockFamily::WarCries),
            r"^\s+(?<name>[A-Z][A-Za-z']*(?: [A-Z][A-Za-z']*)*)\s*$",
            handlers::war_cry_name,
        ),
        // Listing headers and footers.
        Matcher::always(
            S::PsmHeader,
            &format!(r"^\s*[\w'\-]+, the following (?<category>{PSM_PLURAL}) are available:\s*$"),
            handlers::psm_header,
        ),
        Matcher::always(
            S::WarCryHeader,
            r"^\s*You have learned the following War Cries:\s*$",
            |_, _| Some(Hit::open(BlockKind::WarCries)),
        ),
        Matcher::always(
            S::ListingFooter,
            r"^\s*The output listed above was generated based on the following filters:\s*$",
            |_, _| Some(Hit::close()),
        ),
        // Citizenship.
        Matcher::always(
            S::Citizenship,
            r"^You currently have (?:\w+ )?citizenship in (?<town>.+)\.$",
            handlers::citizenship,
        ),
        Matcher::always(
            S::NoCitizenship,
            r"^You don't seem to have citizenship\.$",
            |_, _| {
                Some(Hit::facts(vec![Mutation::set(
                    keys::CITIZENSHIP,
                    keys::NONE_SENTINEL,
                )]))
            },
        ),
        // Character sheet.
        Matcher::always(
            S::CharacterName,
            r"^\s*Name:\s+(?<name>.+?)\s+Race:\s+(?<race>.+?)\s+Profession:\s+(?<profession>\S+)",
            handlers::character_name,
        ),
        Matcher::always(
            S::CharacterGender,
            &format!(
                r"^\s*Gender:\s+(?<gender>\w+)\s+Age:\s+(?<age>{NUM})\s+Expr:\s+(?<experience>{NUM})\s+Level:\s+(?<level>\d+)\s*$"
            ),
            handlers::character_gender,
        ),
        Matcher::always(
            S::StatRow,
            r"^\s*(?<stat>[A-Z][a-z]+) \([A-Z]{3}\):\s+(?<value>\d+) \((?<bonus>-?\d+)\)\s+\.\.\.\s+(?<enhanced>\d+) \((?<enhanced_bonus>-?\d+)\)\s*$",
            handlers::stat_row,
        ),
        Matcher::always(
            S::LevelUpRow,
            r"^\s*(?<stat>[A-Z][a-z]+) \([A-Z]{3}\) :\s+(?<value>\d+)\s+\+(?<delta>\d+)\s+\.\.\.\s+(?<bonus>-?\d+)(?:\s+\+(?<bonus_delta>\d+))?\s*$",
            handlers::level_up_row,
        ),
        Matcher::always(
            S::SkillRow,
            r"^\s+(?<skill>[A-Z][A-Za-z',\- ]*?)\.+\|\s+(?<bonus>-?\d+)\s+(?<ranks>\d+)\s*$",
            handlers::skill_row,
        ),
        // Experience.
        Matcher::always(
            S::LevelFame,
            &format!(r"^\s*Level:\s+(?<level>\d+)\s+Fame:\s+(?<fame>{NUM})\s*$"),
            handlers::level_fame,
        ),
        Matcher::always(
            S::FieldExperience,
            &format!(
                r"^\s*Experience:\s+(?<experience>{NUM})\s+Field Exp:\s+(?<current>{NUM})/(?<max>{NUM})\s*$"
            ),
            handlers::field_experience,
        ),
        Matcher::always(
            S::AscensionExperience,
            &format!(r"^\s*Ascension Exp:\s+(?<ascension>{NUM})\s+Recent Deaths:\s+(?<deaths>{NUM})\s*$"),
            handlers::ascension_experience,
        ),
        Matcher::always(
            S::TotalExperience,
            &format!(r"^\s*Total Exp:\s+(?<total>{NUM})\s+Death's Sting:\s+(?<sting>\S.*?)\s*$"),
            handlers::total_experience,
        ),
        Matcher::always(
            S::LongTermExperience,
            &format!(r"^\s*Long-Term Exp:\s+(?<long_term>{NUM})\s+Deeds:\s+(?<deeds>{NUM})\s*$"),
            handlers::long_term_experience,
        ),
        Matcher::always(
            S::UntilNextLevel,
            &format!(r"^\s*Exp until lvl:\s+(?<until>{NUM})\s*$"),
            handlers::until_next_level,
        ),
        // Resources.
        Matcher::always(
            S::Resource,
            &format!(
                r"^\s*(?<kind>{RESOURCE_TYPES}):\s+(?<weekly>{NUM})/{NUM} \(Weekly\)\s+(?<total>{NUM})/{NUM} \(Total\)\s*$"
            ),
            handlers::resource,
        ),
        Matcher::always(
            S::SuffusedResource,
            &format!(r"^\s*Suffused (?:{RESOURCE_TYPES}):\s+(?<suffused>{NUM})\s*$"),
            handlers::suffused_resource,
        ),
        Matcher::always(
            S::VolnFavor,
            &format!(r"^\s*Voln Favor:\s+(?<favor>{NUM})\s*$"),
            handlers::voln_favor,
        ),
        // Currency.
        Matcher::always(
            S::Silver,
            &format!(r"^You have (?<silver>{NUM}|no) silver with you\.$"),
            handlers::silver,
        ),
        Matcher::always(
            S::SilverContainer,
            &format!(r"^You are carrying (?<silver>{NUM}) silver stored within your coin pouch\.$"),
            handlers::silver_container,
        ),
        Matcher::always(
            S::GigasFragments,
            &format!(r"^You are carrying (?<fragments>{NUM}) gigas artifact fragments?\.$"),
            handlers::gigas_fragments,
        ),
        Matcher::always(
            S::Tickets,
            &format!(r"^\s*(?:{TICKET_VENUES}) - (?<amount>{NUM}) (?<kind>{TICKET_KINDS})\.\s*$"),
            handlers::tickets,
        ),
        Matcher::always(
            S::RedsteelMarks,
            &format!(r"^\s*Redsteel Marks:\s+(?<marks>{NUM})\s*$"),
            handlers::redsteel_marks,
        ),
        // Training narration.
        Matcher::always(
            S::LearnPsm,
            &format!(
                r"^You have now achieved rank (?<rank>\d+) of (?<name>[^,]+), costing \d+ (?<category>{PSM_SINGULAR}) points?\.$"
            ),
            handlers::psm_absolute,
        ),
        Matcher::always(
            S::GainTechnique,
            &format!(r"^\[You have gained rank (?<rank>\d+) of (?<category>{PSM_SINGULAR}): (?<name>[^\]]+)\.\]$"),
            handlers::psm_absolute,
        ),
        Matcher::always(
            S::ChangeTechnique,
            &format!(
                r"^\[You have (?:increased|decreased) to rank (?<rank>\d+) of (?<category>{PSM_SINGULAR}): (?<name>[^\]]+)\.\]$"
            ),
            handlers::psm_absolute,
        ),
        Matcher::always(
            S::UnlearnPsm,
            &format!(
                r"^You decide to unlearn rank \d+ of (?<name>[^,]+), regaining \d+ (?<category>{PSM_SINGULAR}) points?\.$"
            ),
            handlers::psm_unlearn,
        ),
        Matcher::always(
            S::LostTechnique,
            &format!(r"^\[You are no longer trained in (?<category>{PSM_SINGULAR}): (?<name>[^\]]+)\.\]$"),
            handlers::psm_lost,
        ),
        // Society.
        Matcher::always(
            S::SocietyNone,
            r"^\s*You are not a member of any society at this time\.\s*$",
            |_, _| Some(handlers::society(keys::NONE_SENTINEL, 0)),
        ),
        Matcher::always(
            S::SocietyMember,
            &format!(r"^\s*You are a member in the (?<society>{SOCIETIES}) at (?:step|rank) (?<rank>\d+)\.\s*$"),
            handlers::society_member,
        ),
        Matcher::always(
            S::SocietyMaster,
            &format!(r"^\s*You are a Master in the (?<society>{SOCIETIES})\.\s*$"),
            handlers::society_master,
        ),
        Matcher::always(
            S::SocietyJoin,
            &format!(r#"^The Grandmaster says, "Welcome to the (?<society>{SOCIETIES})\."$"#),
            |c, _| Some(handlers::society(c.name("society")?.as_str(), 1)),
        ),
        Matcher::always(
            S::SocietyEnroll,
            &format!(r#"^The Grandmaster says, "You are now a member of the (?<society>{SOCIETIES})\."$"#),
            |c, _| Some(handlers::society(c.name("society")?.as_str(), 0)),
        ),
        Matcher::always(
            S::SocietyResign,
            r#"^The Grandmaster says, "I'm sorry to hear that\.  You are no longer in our service\."?$"#,
            |_, _| Some(handlers::society(keys::NONE_SENTINEL, 0)),
        ),
        // Status narration.
        Matcher::status(
            E::Sleep,
            true,
            r"^(?:Your mind goes completely blank\.|You close your eyes and slowly drift off to sleep\.|You slump to the ground and immediately fall asleep\.  You must have been exhausted!)$",
        ),
        Matcher::status(
            E::Sleep,
            false,
            r"^(?:Your thoughts slowly come back to you as you find yourself lying on the ground\.  You must have been sleeping\.$|You wake up from your slumber\.$|You are awoken|You awake)",
        ),
        Matcher::status(
            E::Bind,
            true,
            r"^An unseen force envelops you, restricting all movement\.$",
        ),
        Matcher::status(
            E::Bind,
            false,
            r"^(?:The restricting force that envelops you dissolves away\.|You shake off the immobilization that was restricting your movements!)$",
        ),
        Matcher::status(
            E::Silence,
            true,
            r"^(?:A pall of silence settles over you\.|The pall of silence settles more heavily over you\.)$",
        ),
        Matcher::status(E::Silence, false, r"^The pall of silence leaves you\.$"),
        Matcher::status(E::Calm, true, r"^A calm washes over you\.$"),
        Matcher::status(
            E::Calm,
            false,
            r"^(?:You are enraged by .+ attack!|The feeling of calm leaves you\.)$",
        ),
        Matcher::status(
            E::Cutthroat,
            true,
            r"^(?:The .+ slices deep into your vocal cords!|All you manage to do is cough up some blood\.)$",
        ),
        Matcher::status(
            E::Cutthroat,
            false,
            r"^The horrible pain in your vocal cords subsides as you spit out the last of the blood clogging your throat\.$",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_pattern_compiles() {
        assert!(catalogue().len() > 40);
    }

    #[test]
    fn block_scoped_shapes_precede_generic_ones() {
        let first_always = catalogue()
            .iter()
            .position(|m| m.scope == Scope::Always)
            .expect("generic shapes present");
        assert!(first_always > 0);
        assert!(
            catalogue()[first_always..]
                .iter()
                .all(|m| m.scope == Scope::Always),
            "block-scoped shape listed after a generic one"
        );
    }

    #[test]
    fn shape_ids_are_unique() {
        let mut seen = HashSet::new();
        for matcher in catalogue() {
            assert!(seen.insert(matcher.shape), "duplicate {:?}", matcher.shape);
        }
    }

    #[test]
    fn every_status_effect_has_onset_and_clear() {
        for effect in StatusEffect::ALL {
            let shapes: Vec<_> = catalogue().iter().map(|m| m.shape).collect();
            assert!(shapes.contains(&ShapeId::StatusOnset(effect)));
            assert!(shapes.contains(&ShapeId::StatusClear(effect)));
        }
    }

    #[test]
    fn patterns_are_anchored() {
        for matcher in catalogue() {
            assert!(matcher.pattern().starts_with('^'), "{:?}", matcher.shape);
        }
    }

    #[test]
    fn scopes_admit_their_blocks() {
        use crate::lookup::PsmCategory;
        let psm = Some(BlockKind::Psm(PsmCategory::Feat));
        assert!(Scope::Always.admits(None));
        assert!(Scope::InBlock(BlockFamily::Psm).admits(psm));
        assert!(!Scope::InBlock(BlockFamily::Psm).admits(None));
        assert!(!Scope::InBlock(BlockFamily::WarCries).admits(psm));
    }
}
