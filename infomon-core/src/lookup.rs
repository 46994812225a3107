//! Static name → mnemonic tables for trainable abilities.
//!
//! Narration names abilities by their display name ("Rolling Krynch
//! Stance", "Armored Stealth") while facts are keyed by the game's mnemonic
//! (`cman.krynch`, `armor.stealth`). The tables are built once and looked up
//! by function call.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use crate::keys::segment;

/// A trainable ability family, also the first segment of its fact keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PsmCategory {
    /// Combat maneuvers.
    Cman,
    /// Shield specializations.
    Shield,
    /// Armor specializations.
    Armor,
    /// Weapon techniques.
    Weapon,
    /// Feats.
    Feat,
    /// Ascension abilities.
    Ascension,
}

impl PsmCategory {
    /// All categories.
    pub const ALL: [Self; 6] = [
        Self::Cman,
        Self::Shield,
        Self::Armor,
        Self::Weapon,
        Self::Feat,
        Self::Ascension,
    ];

    /// Key prefix (`cman`, `shield`, ...).
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Cman => "cman",
            Self::Shield => "shield",
            Self::Armor => "armor",
            Self::Weapon => "weapon",
            Self::Feat => "feat",
            Self::Ascension => "ascension",
        }
    }

    /// Fact key for one mnemonic in this category.
    #[must_use]
    pub fn key(self, mnemonic: &str) -> String {
        format!("{}.{}", self.prefix(), mnemonic.to_ascii_lowercase())
    }

    /// Parse the singular label used in training narration
    /// ("Combat Maneuver", "Shield Specialization", "Feat", ...).
    #[must_use]
    pub fn from_narration(label: &str) -> Option<Self> {
        match label.trim() {
            "Combat Maneuver" | "Combat Maneuvers" => Some(Self::Cman),
            "Shield Specialization" | "Shield Specializations" => Some(Self::Shield),
            "Armor Specialization" | "Armor Specializations" => Some(Self::Armor),
            "Weapon Technique" | "Weapon Techniques" => Some(Self::Weapon),
            "Feat" | "Feats" => Some(Self::Feat),
            "Ascension Ability" | "Ascension Abilities" => Some(Self::Ascension),
            _ => None,
        }
    }

    fn table(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Cman => CMAN,
            Self::Shield => SHIELD,
            Self::Armor => ARMOR,
            Self::Weapon => WEAPON,
            Self::Feat => FEAT,
            Self::Ascension => ASCENSION,
        }
    }
}

impl fmt::Display for PsmCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Exact-match index: normalised long name, mnemonic, and underscore-free
/// long name all point at the mnemonic.
static INDEX: LazyLock<HashMap<(PsmCategory, String), &'static str>> = LazyLock::new(|| {
    let mut index = HashMap::new();
    for category in PsmCategory::ALL {
        for &(long_name, mnemonic) in category.table() {
            index.insert((category, long_name.to_string()), mnemonic);
            index.insert((category, long_name.replace('_', "")), mnemonic);
            index.entry((category, mnemonic.to_string())).or_insert(mnemonic);
        }
    }
    index
});

/// Resolve a display name (or mnemonic) to its mnemonic.
///
/// Falls back to a unique suffix match on the long name, so "Pin" finds
/// `shield_pin`. Returns `None` for unknown or ambiguous names.
#[must_use]
pub fn resolve(category: PsmCategory, name: &str) -> Option<&'static str> {
    let normalised = segment(name);
    if normalised.is_empty() {
        return None;
    }
    if let Some(mnemonic) = INDEX
        .get(&(category, normalised.clone()))
        .or_else(|| INDEX.get(&(category, normalised.replace('_', ""))))
    {
        return Some(mnemonic);
    }

    let suffix = format!("_{normalised}");
    let mut hits = category
        .table()
        .iter()
        .filter(|(long_name, _)| long_name.ends_with(&suffix));
    match (hits.next(), hits.next()) {
        (Some(&(_, mnemonic)), None) => Some(mnemonic),
        _ => None,
    }
}

/// Resolve a display name straight to its fact key.
#[must_use]
pub fn fact_key(category: PsmCategory, name: &str) -> Option<String> {
    resolve(category, name).map(|mnemonic| category.key(mnemonic))
}

// ---------------------------------------------------------------------------
// Tables: (long_name, mnemonic)
// ---------------------------------------------------------------------------

const CMAN: &[(&str, &str)] = &[
    ("acrobats_leap", "acrobatsleap"),
    ("bearhug", "bearhug"),
    ("berserk", "berserk"),
    ("block_specialization", "blockspec"),
    ("cheapshots", "cheapshots"),
    ("combat_focus", "focus"),
    ("combat_mobility", "mobility"),
    ("combat_movement", "cmovement"),
    ("combat_toughness", "toughness"),
    ("coup_de_grace", "coupdegrace"),
    ("crowd_press", "cpress"),
    ("cunning_defense", "cdefense"),
    ("cutthroat", "cutthroat"),
    ("dirtkick", "dirtkick"),
    ("disarm_weapon", "disarm"),
    ("dislodge", "dislodge"),
    ("divert", "divert"),
    ("duck_and_weave", "duckandweave"),
    ("dust_shroud", "shroud"),
    ("evade_specialization", "evadespec"),
    ("eviscerate", "eviscerate"),
    ("executioners_stance", "executioner"),
    ("exsanguinate", "exsanguinate"),
    ("eyepoke", "eyepoke"),
    ("feint", "feint"),
    ("flurry_of_blows", "flurry"),
    ("footstomp", "footstomp"),
    ("garrote", "garrote"),
    ("grapple_specialization", "grapplespec"),
    ("griffins_voice", "griffin"),
    ("groin_kick", "gkick"),
    ("hamstring", "hamstring"),
    ("haymaker", "haymaker"),
    ("headbutt", "headbutt"),
    ("inner_harmony", "iharmony"),
    ("internal_power", "ipower"),
    ("ki_focus", "kifocus"),
    ("kick_specialization", "kickspec"),
    ("kneebash", "kneebash"),
    ("leap_attack", "leapattack"),
    ("mighty_blow", "mblow"),
    ("mug", "mug"),
    ("nosetweak", "nosetweak"),
    ("parry_specialization", "parryspec"),
    ("precision", "precision"),
    ("predators_eye", "predator"),
    ("punch_specialization", "punchspec"),
    ("retreat", "retreat"),
    ("rolling_krynch_stance", "krynch"),
    ("shield_bash", "sbash"),
    ("side_by_side", "sidebyside"),
    ("slippery_mind", "slipperymind"),
    ("spike_focus", "spikefocus"),
    ("spin_attack", "spinattack"),
    ("staggering_blow", "sblow"),
    ("stance_of_the_mongoose", "mongoose"),
    ("striking_asp", "asp"),
    ("stun_maneuvers", "stunman"),
    ("subdue", "subdue"),
    ("sucker_punch", "suckerpunch"),
    ("sunder_shield", "sunder"),
    ("surge_of_strength", "surge"),
    ("sweep", "sweep"),
    ("swiftkick", "swiftkick"),
    ("tackle", "tackle"),
    ("tainted_bond", "tainted"),
    ("templeshot", "templeshot"),
    ("throatchop", "throatchop"),
    ("trip", "trip"),
    ("true_strike", "truestrike"),
    ("unarmed_specialist", "unarmedspec"),
    ("vault_kick", "vaultkick"),
    ("weapon_specialization", "wspec"),
    ("whirling_dervish", "dervish"),
];

const SHIELD: &[(&str, &str)] = &[
    ("adamantine_bulwark", "bulwark"),
    ("block_the_elements", "blockelements"),
    ("deflect_the_elements", "deflectelements"),
    ("disarming_presence", "dpresence"),
    ("guard_mastery", "gmastery"),
    ("large_shield_focus", "lfocus"),
    ("medium_shield_focus", "mfocus"),
    ("phalanx", "phalanx"),
    ("prop_up", "prop"),
    ("protective_wall", "pwall"),
    ("shield_bash", "bash"),
    ("shield_charge", "charge"),
    ("shield_forward", "forward"),
    ("shield_mind", "mind"),
    ("shield_pin", "pin"),
    ("shield_push", "push"),
    ("shield_riposte", "riposte"),
    ("shield_spike_mastery", "spikemastery"),
    ("shield_strike", "strike"),
    ("shield_strike_mastery", "strikemastery"),
    ("shield_swiftness", "swiftness"),
    ("shield_throw", "throw"),
    ("shield_trample", "trample"),
    ("shielded_brawler", "brawler"),
    ("small_shield_focus", "sfocus"),
    ("spell_block", "spellblock"),
    ("steady_shield", "steady"),
    ("steely_resolve", "resolve"),
    ("tortoise_stance", "tortoise"),
    ("tower_shield_focus", "tfocus"),
];

const ARMOR: &[(&str, &str)] = &[
    ("armor_blessing", "blessing"),
    ("armor_reinforcement", "reinforcement"),
    ("armor_spike_mastery", "spikemastery"),
    ("armor_support", "support"),
    ("armored_casting", "casting"),
    ("armored_evasion", "evasion"),
    ("armored_fluidity", "fluidity"),
    ("armored_stealth", "stealth"),
    ("crush_protection", "crush"),
    ("puncture_protection", "puncture"),
    ("slash_protection", "slash"),
];

const WEAPON: &[(&str, &str)] = &[
    ("barrage", "barrage"),
    ("charge", "charge"),
    ("clash", "clash"),
    ("clobber", "clobber"),
    ("cripple", "cripple"),
    ("cyclone", "cyclone"),
    ("dizzying_swing", "dizzyingswing"),
    ("flurry", "flurry"),
    ("fury", "fury"),
    ("guardant_thrusts", "gthrusts"),
    ("overpower", "overpower"),
    ("pin_down", "pindown"),
    ("pulverize", "pulverize"),
    ("pummel", "pummel"),
    ("radial_sweep", "radialsweep"),
    ("reactive_shot", "reactiveshot"),
    ("reverse_strike", "reversestrike"),
    ("riposte", "riposte"),
    ("spin_kick", "spinkick"),
    ("thrash", "thrash"),
    ("twin_hammerfists", "twinhammer"),
    ("volley", "volley"),
    ("whirling_blade", "wblade"),
    ("whirlwind", "whirlwind"),
];

const FEAT: &[(&str, &str)] = &[
    ("absorb_magic", "absorbmagic"),
    ("chain_armor_proficiency", "chainarmor"),
    ("combat_mastery", "combatmastery"),
    ("critical_counter", "criticalcounter"),
    ("dispel_magic", "dispelmagic"),
    ("dragonscale_skin", "dragonscaleskin"),
    ("excoriate", "excoriate"),
    ("guard", "guard"),
    ("kroderine_soul", "kroderinesoul"),
    ("light_armor_proficiency", "lightarmor"),
    ("martial_arts_mastery", "martialarts"),
    ("martial_mastery", "martialmastery"),
    ("mental_acuity", "mentalacuity"),
    ("mystic_strike", "mysticstrike"),
    ("mystic_tattoo", "tattoo"),
    ("perfect_self", "perfectself"),
    ("plate_armor_proficiency", "platearmor"),
    ("scale_armor_proficiency", "scalearmor"),
    ("shadow_dance", "shadowdance"),
    ("silent_strike", "silentstrike"),
    ("vanish", "vanish"),
    ("weapon_bonding", "weaponbonding"),
];

const ASCENSION: &[(&str, &str)] = &[
    ("acid_resistance", "resistacid"),
    ("agility", "agility"),
    ("ambush", "ambush"),
    ("arcane_symbols", "arcanesymbols"),
    ("armor_use", "armoruse"),
    ("aura", "aura"),
    ("blunt_weapons", "bluntweapons"),
    ("brawling", "brawling"),
    ("climbing", "climbing"),
    ("cold_resistance", "resistcold"),
    ("combat_maneuvers", "combatmaneuvers"),
    ("constitution", "constitution"),
    ("crush_resistance", "resistcrush"),
    ("dexterity", "dexterity"),
    ("disarming_traps", "disarmingtraps"),
    ("discipline", "discipline"),
    ("disintegration_resistance", "resistdisintegr"),
    ("disruption_resistance", "resistdisruptio"),
    ("dodging", "dodging"),
    ("edged_weapons", "edgedweapons"),
    ("electric_resistance", "resistelectric"),
    ("elemental_lore_air", "elair"),
    ("elemental_lore_earth", "elearth"),
    ("elemental_lore_fire", "elfire"),
    ("elemental_lore_water", "elwater"),
    ("elemental_mana_control", "elementalmc"),
    ("first_aid", "firstaid"),
    ("grapple_resistance", "resistgrapple"),
    ("harness_power", "harnesspower"),
    ("health_regeneration", "regenhealth"),
    ("heat_resistance", "resistheat"),
    ("impact_resistance", "resistimpact"),
    ("influence", "influence"),
    ("intuition", "intuition"),
    ("logic", "logic"),
    ("magic_item_use", "magicitemuse"),
    ("mana_regeneration", "regenmana"),
    ("mental_lore_divination", "mldivination"),
    ("mental_lore_manipulation", "mlmanipulation"),
    ("mental_lore_telepathy", "mltelepathy"),
    ("mental_lore_transference", "mltransference"),
    ("mental_lore_transform", "mltransform"),
    ("mental_mana_control", "mentalmc"),
    ("multi_opponent_combat", "multiopponent"),
    ("perception", "perception"),
    ("physical_fitness", "physicalfitness"),
    ("picking_locks", "pickinglocks"),
    ("picking_pockets", "pickingpockets"),
    ("plasma_resistance", "resistplasma"),
    ("polearm_weapons", "polearmsweapons"),
    ("porter", "porter"),
    ("puncture_resistance", "resistpuncture"),
    ("ranged_weapons", "rangedweapons"),
    ("shield_use", "shielduse"),
    ("slash_resistance", "resistslash"),
    ("sorcerous_lore_demonology", "soldemonology"),
    ("sorcerous_lore_necromancy", "solnecromancy"),
    ("spell_aiming", "spellaiming"),
    ("spirit_mana_control", "spiritmc"),
    ("spiritual_lore_blessings", "slblessings"),
    ("spiritual_lore_religion", "slreligion"),
    ("spiritual_lore_summoning", "slsummoning"),
    ("stalking_and_hiding", "stalking"),
    ("stamina_regeneration", "regenstamina"),
    ("steam_resistance", "resiststeam"),
    ("strength", "strength"),
    ("survival", "survival"),
    ("swimming", "swimming"),
    ("thrown_weapons", "thrownweapons"),
    ("trading", "trading"),
    ("two_weapon_combat", "twoweaponcombat"),
    ("two_handed_weapons", "twohandedweapon"),
    ("unbalance_resistance", "resistunbalance"),
    ("vacuum_resistance", "resistvacuum"),
    ("wisdom", "wisdom"),
    ("transcend_destiny", "trandest"),
];
