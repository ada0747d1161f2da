use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::resources::{ActionCost, ResourceKind, StatDelta};
use super::timestamp::MILLIS_PER_HOUR;

/// Upper bound any action's `max_multiplier` may configure. Costs never rise
/// past three times base.
pub const MAX_COST_MULTIPLIER: f64 = 3.0;

/// Catalog id of the action behind `give_speech`.
pub const SPEECH_ACTION: &str = "stump_speech";
/// Catalog id of the action behind `attack`.
pub const ATTACK_ACTION: &str = "attack_ad";
/// Catalog id of the action behind `support`.
pub const SUPPORT_ACTION: &str = "endorsement";

/// Action family. Targeted categories act on another player's candidacy; the
/// rest act on the actor alone.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    Fundraising,
    Speech,
    CampaignOperation,
    TargetedAttack,
    TargetedSupport,
}

impl ActionCategory {
    /// Return the serde string for this variant (for messages and Postgres COPY).
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionCategory::Fundraising => "fundraising",
            ActionCategory::Speech => "speech",
            ActionCategory::CampaignOperation => "campaign_operation",
            ActionCategory::TargetedAttack => "targeted_attack",
            ActionCategory::TargetedSupport => "targeted_support",
        }
    }

    pub fn is_targeted(&self) -> bool {
        matches!(
            self,
            ActionCategory::TargetedAttack | ActionCategory::TargetedSupport
        )
    }
}

impl fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progressive-cost configuration: which stat is sampled and how the
/// multiplier grows above the reference value.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostScaling {
    /// Stat sampled from the actor's ledger at request time.
    pub reference_stat: ResourceKind,
    /// Stat value at which cost starts rising above base. Must be positive.
    pub reference_value: f64,
    /// Slope applied to the ratio above 1. Must be non-negative.
    pub scaling_constant: f64,
    /// Hard cap on the multiplier, within `[1, MAX_COST_MULTIPLIER]`.
    pub max_multiplier: f64,
}

/// Minimum-stat gate checked against the actor's current ledger before cost
/// computation.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatRequirement {
    pub stat: ResourceKind,
    pub min: f64,
}

/// One outcome of a probabilistic action. Weights are relative within the
/// table; exactly one branch is drawn per execution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutcomeBranch {
    pub weight: u32,
    /// Short label surfaced in logs and result messages ("success", "backfire").
    pub label: String,
    #[serde(default)]
    pub actor: StatDelta,
    #[serde(default)]
    pub target: StatDelta,
    pub message: String,
}

/// What an action does once its cost has been paid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectSpec {
    /// Fixed deltas applied on every execution.
    Deterministic {
        #[serde(default)]
        actor: StatDelta,
        #[serde(default)]
        target: StatDelta,
        message: String,
    },
    /// One weighted branch drawn per execution.
    Probabilistic { branches: Vec<OutcomeBranch> },
}

/// A configured action: costs, scaling, gates, cooldown, and effects.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionDefinition {
    pub id: String,
    /// Display name used in outcome messages.
    pub name: String,
    pub category: ActionCategory,
    pub base_cost: ActionCost,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaling: Option<CostScaling>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<StatRequirement>,
    /// Wall-clock cooldown in milliseconds; zero means always available.
    #[serde(default)]
    pub cooldown_ms: u64,
    pub effect: EffectSpec,
}

impl ActionDefinition {
    pub fn is_targeted(&self) -> bool {
        self.category.is_targeted()
    }
}

/// A definition the catalog refused to load.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("action with empty id")]
    EmptyId,
    #[error("duplicate action id `{0}`")]
    DuplicateId(String),
    #[error("action `{id}`: negative base funds cost {funds}")]
    NegativeBaseFunds { id: String, funds: i64 },
    #[error("action `{id}`: max_multiplier {value} outside [1, {MAX_COST_MULTIPLIER}]")]
    MultiplierOutOfRange { id: String, value: f64 },
    #[error("action `{id}`: reference value {value} must be positive")]
    NonPositiveReference { id: String, value: f64 },
    #[error("action `{id}`: scaling constant {value} must be non-negative")]
    NegativeScalingConstant { id: String, value: f64 },
    #[error("action `{id}`: negative minimum for {stat}")]
    NegativeRequirement { id: String, stat: ResourceKind },
    #[error("action `{id}`: probability table is empty")]
    EmptyTable { id: String },
    #[error("action `{id}`: probability table has zero total weight")]
    ZeroTotalWeight { id: String },
    #[error("action `{id}`: target deltas on a non-targeted action")]
    UnexpectedTargetDelta { id: String },
}

/// Registry of action definitions, validated at load time and injected into
/// the resolver at construction. Read-only at request time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ActionDefinition>", into = "Vec<ActionDefinition>")]
pub struct ActionCatalog {
    actions: BTreeMap<String, ActionDefinition>,
}

impl TryFrom<Vec<ActionDefinition>> for ActionCatalog {
    type Error = CatalogError;

    fn try_from(defs: Vec<ActionDefinition>) -> Result<Self, CatalogError> {
        if let Err(err) = validate(&defs) {
            tracing::warn!("rejecting action catalog: {err}");
            return Err(err);
        }
        Ok(Self {
            actions: defs.into_iter().map(|def| (def.id.clone(), def)).collect(),
        })
    }
}

impl From<ActionCatalog> for Vec<ActionDefinition> {
    fn from(catalog: ActionCatalog) -> Self {
        catalog.actions.into_values().collect()
    }
}

impl ActionCatalog {
    /// Build a catalog from definitions, rejecting broken entries before the
    /// engine ever sees them.
    pub fn new(defs: Vec<ActionDefinition>) -> Result<Self, CatalogError> {
        Self::try_from(defs)
    }

    /// The built-in tuned catalog covering every action family.
    ///
    /// # Panics
    /// Panics if the shipped table fails its own validation, which would be a
    /// defect in this crate rather than in caller input.
    pub fn standard() -> Self {
        match Self::new(standard_definitions()) {
            Ok(catalog) => catalog,
            Err(err) => panic!("standard catalog failed validation: {err}"),
        }
    }

    pub fn get(&self, id: &str) -> Option<&ActionDefinition> {
        self.actions.get(id)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Iterate definitions in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ActionDefinition> {
        self.actions.values()
    }
}

fn validate(defs: &[ActionDefinition]) -> Result<(), CatalogError> {
    let mut seen = BTreeSet::new();
    for def in defs {
        if def.id.is_empty() {
            return Err(CatalogError::EmptyId);
        }
        if !seen.insert(def.id.clone()) {
            return Err(CatalogError::DuplicateId(def.id.clone()));
        }
        if def.base_cost.funds < 0 {
            return Err(CatalogError::NegativeBaseFunds {
                id: def.id.clone(),
                funds: def.base_cost.funds,
            });
        }
        if let Some(scaling) = &def.scaling {
            if !(1.0..=MAX_COST_MULTIPLIER).contains(&scaling.max_multiplier) {
                return Err(CatalogError::MultiplierOutOfRange {
                    id: def.id.clone(),
                    value: scaling.max_multiplier,
                });
            }
            if scaling.reference_value <= 0.0 {
                return Err(CatalogError::NonPositiveReference {
                    id: def.id.clone(),
                    value: scaling.reference_value,
                });
            }
            if scaling.scaling_constant < 0.0 {
                return Err(CatalogError::NegativeScalingConstant {
                    id: def.id.clone(),
                    value: scaling.scaling_constant,
                });
            }
        }
        for req in &def.requirements {
            if req.min < 0.0 {
                return Err(CatalogError::NegativeRequirement {
                    id: def.id.clone(),
                    stat: req.stat,
                });
            }
        }
        match &def.effect {
            EffectSpec::Deterministic { target, .. } => {
                if !def.category.is_targeted() && !target.is_zero() {
                    return Err(CatalogError::UnexpectedTargetDelta { id: def.id.clone() });
                }
            }
            EffectSpec::Probabilistic { branches } => {
                if branches.is_empty() {
                    return Err(CatalogError::EmptyTable { id: def.id.clone() });
                }
                if branches.iter().map(|b| b.weight).sum::<u32>() == 0 {
                    return Err(CatalogError::ZeroTotalWeight { id: def.id.clone() });
                }
                if !def.category.is_targeted() && branches.iter().any(|b| !b.target.is_zero()) {
                    return Err(CatalogError::UnexpectedTargetDelta { id: def.id.clone() });
                }
            }
        }
    }
    Ok(())
}

// Standard catalog tuning. Costs are AP / dollars / PC; effect deltas are in
// the unit of the stat they move.
const GRASSROOTS_AP_COST: u32 = 15;
const GRASSROOTS_FUNDS_RAISED: i64 = 2_500;
const GRASSROOTS_APPROVAL_GAIN: f64 = 1.0;

const DONOR_DINNER_AP_COST: u32 = 10;
const DONOR_DINNER_FUNDS_COST: i64 = 500;
const DONOR_DINNER_MIN_APPROVAL: f64 = 40.0;
const DONOR_DINNER_FUNDS_RAISED: i64 = 10_000;

const SPEECH_AP_COST: u32 = 5;
const SPEECH_APPROVAL_GAIN: f64 = 1.5;
const SPEECH_RECOGNITION_GAIN: f64 = 2.0;
const SPEECH_COOLDOWN_MS: u64 = MILLIS_PER_HOUR;

const RALLY_AP_COST: u32 = 10;
const RALLY_FUNDS_COST: i64 = 1_000;
const RALLY_COOLDOWN_MS: u64 = 2 * MILLIS_PER_HOUR;
const RALLY_SUCCESS_WEIGHT: u32 = 70;
const RALLY_FIZZLE_WEIGHT: u32 = 30;
const RALLY_STRENGTH_GAIN: f64 = 5.0;
const RALLY_APPROVAL_GAIN: f64 = 2.0;
const RALLY_FIZZLE_STRENGTH_GAIN: f64 = 1.0;

const AD_BLITZ_AP_COST: u32 = 5;
const AD_BLITZ_FUNDS_COST: i64 = 5_000;
const AD_BLITZ_RECOGNITION_GAIN: f64 = 8.0;

const CANVASSING_AP_COST: u32 = 8;
const CANVASSING_RECOGNITION_GAIN: f64 = 3.0;
const CANVASSING_STRENGTH_GAIN: f64 = 1.0;

const ATTACK_AD_AP_COST: u32 = 10;
const ATTACK_AD_FUNDS_COST: i64 = 2_000;
const ATTACK_AD_PC_COST: u32 = 1;
const ATTACK_AD_COOLDOWN_MS: u64 = MILLIS_PER_HOUR;
const ATTACK_AD_SUCCESS_WEIGHT: u32 = 70;
const ATTACK_AD_BACKFIRE_WEIGHT: u32 = 30;
const ATTACK_AD_APPROVAL_HIT: f64 = 4.0;
const ATTACK_AD_BACKFIRE_HIT: f64 = 2.0;

const ENDORSEMENT_AP_COST: u32 = 5;
const ENDORSEMENT_PC_COST: u32 = 2;
const ENDORSEMENT_APPROVAL_GAIN: f64 = 3.0;

// Fundraising scales on accumulated funds (income-ratio shape); operations
// scale on the stat they raise (stat-percentage shape). Same formula, per-
// family configuration.
const FUNDRAISING_REFERENCE_FUNDS: f64 = 10_000.0;
const FUNDRAISING_SCALING: f64 = 0.75;
const FUNDRAISING_MAX_MULTIPLIER: f64 = 3.0;
const OPERATION_REFERENCE_STAT: f64 = 50.0;
const OPERATION_SCALING: f64 = 1.0;
const OPERATION_MAX_MULTIPLIER: f64 = 3.0;

fn fundraising_scaling() -> CostScaling {
    CostScaling {
        reference_stat: ResourceKind::Funds,
        reference_value: FUNDRAISING_REFERENCE_FUNDS,
        scaling_constant: FUNDRAISING_SCALING,
        max_multiplier: FUNDRAISING_MAX_MULTIPLIER,
    }
}

fn operation_scaling(stat: ResourceKind) -> CostScaling {
    CostScaling {
        reference_stat: stat,
        reference_value: OPERATION_REFERENCE_STAT,
        scaling_constant: OPERATION_SCALING,
        max_multiplier: OPERATION_MAX_MULTIPLIER,
    }
}

fn standard_definitions() -> Vec<ActionDefinition> {
    vec![
        ActionDefinition {
            id: "grassroots_fundraising".to_string(),
            name: "Grassroots Fundraising".to_string(),
            category: ActionCategory::Fundraising,
            base_cost: ActionCost {
                action_points: GRASSROOTS_AP_COST,
                ..ActionCost::default()
            },
            scaling: Some(fundraising_scaling()),
            requirements: Vec::new(),
            cooldown_ms: 0,
            effect: EffectSpec::Deterministic {
                actor: StatDelta {
                    funds: GRASSROOTS_FUNDS_RAISED,
                    approval: GRASSROOTS_APPROVAL_GAIN,
                    ..StatDelta::default()
                },
                target: StatDelta::default(),
                message: format!("Raised ${GRASSROOTS_FUNDS_RAISED} through grassroots fundraising."),
            },
        },
        ActionDefinition {
            id: "donor_dinner".to_string(),
            name: "High-Donor Dinner".to_string(),
            category: ActionCategory::Fundraising,
            base_cost: ActionCost {
                action_points: DONOR_DINNER_AP_COST,
                funds: DONOR_DINNER_FUNDS_COST,
                ..ActionCost::default()
            },
            scaling: Some(fundraising_scaling()),
            requirements: vec![StatRequirement {
                stat: ResourceKind::Approval,
                min: DONOR_DINNER_MIN_APPROVAL,
            }],
            cooldown_ms: 0,
            effect: EffectSpec::Deterministic {
                actor: StatDelta {
                    funds: DONOR_DINNER_FUNDS_RAISED,
                    ..StatDelta::default()
                },
                target: StatDelta::default(),
                message: format!("Raised ${DONOR_DINNER_FUNDS_RAISED} at a high-donor dinner."),
            },
        },
        ActionDefinition {
            id: SPEECH_ACTION.to_string(),
            name: "Stump Speech".to_string(),
            category: ActionCategory::Speech,
            base_cost: ActionCost {
                action_points: SPEECH_AP_COST,
                ..ActionCost::default()
            },
            scaling: None,
            requirements: Vec::new(),
            cooldown_ms: SPEECH_COOLDOWN_MS,
            effect: EffectSpec::Deterministic {
                actor: StatDelta {
                    approval: SPEECH_APPROVAL_GAIN,
                    name_recognition: SPEECH_RECOGNITION_GAIN,
                    ..StatDelta::default()
                },
                target: StatDelta::default(),
                message: "Delivered a stump speech to local voters.".to_string(),
            },
        },
        ActionDefinition {
            id: "rally".to_string(),
            name: "Campaign Rally".to_string(),
            category: ActionCategory::CampaignOperation,
            base_cost: ActionCost {
                action_points: RALLY_AP_COST,
                funds: RALLY_FUNDS_COST,
                ..ActionCost::default()
            },
            scaling: Some(operation_scaling(ResourceKind::CampaignStrength)),
            requirements: Vec::new(),
            cooldown_ms: RALLY_COOLDOWN_MS,
            effect: EffectSpec::Probabilistic {
                branches: vec![
                    OutcomeBranch {
                        weight: RALLY_SUCCESS_WEIGHT,
                        label: "success".to_string(),
                        actor: StatDelta {
                            campaign_strength: RALLY_STRENGTH_GAIN,
                            approval: RALLY_APPROVAL_GAIN,
                            ..StatDelta::default()
                        },
                        target: StatDelta::default(),
                        message: "The rally energized supporters.".to_string(),
                    },
                    OutcomeBranch {
                        weight: RALLY_FIZZLE_WEIGHT,
                        label: "fizzle".to_string(),
                        actor: StatDelta {
                            campaign_strength: RALLY_FIZZLE_STRENGTH_GAIN,
                            ..StatDelta::default()
                        },
                        target: StatDelta::default(),
                        message: "The rally drew a thin crowd.".to_string(),
                    },
                ],
            },
        },
        ActionDefinition {
            id: "ad_blitz".to_string(),
            name: "Statewide Ad Blitz".to_string(),
            category: ActionCategory::CampaignOperation,
            base_cost: ActionCost {
                action_points: AD_BLITZ_AP_COST,
                funds: AD_BLITZ_FUNDS_COST,
                ..ActionCost::default()
            },
            scaling: Some(operation_scaling(ResourceKind::NameRecognition)),
            requirements: Vec::new(),
            cooldown_ms: 0,
            effect: EffectSpec::Deterministic {
                actor: StatDelta {
                    name_recognition: AD_BLITZ_RECOGNITION_GAIN,
                    ..StatDelta::default()
                },
                target: StatDelta::default(),
                message: "Launched a statewide ad blitz.".to_string(),
            },
        },
        ActionDefinition {
            id: "canvassing".to_string(),
            name: "Door-to-Door Canvassing".to_string(),
            category: ActionCategory::CampaignOperation,
            base_cost: ActionCost {
                action_points: CANVASSING_AP_COST,
                ..ActionCost::default()
            },
            scaling: Some(operation_scaling(ResourceKind::NameRecognition)),
            requirements: Vec::new(),
            cooldown_ms: 0,
            effect: EffectSpec::Deterministic {
                actor: StatDelta {
                    name_recognition: CANVASSING_RECOGNITION_GAIN,
                    campaign_strength: CANVASSING_STRENGTH_GAIN,
                    ..StatDelta::default()
                },
                target: StatDelta::default(),
                message: "Canvassed neighborhoods door to door.".to_string(),
            },
        },
        ActionDefinition {
            id: ATTACK_ACTION.to_string(),
            name: "Attack Ad".to_string(),
            category: ActionCategory::TargetedAttack,
            base_cost: ActionCost {
                action_points: ATTACK_AD_AP_COST,
                funds: ATTACK_AD_FUNDS_COST,
                political_capital: ATTACK_AD_PC_COST,
            },
            scaling: None,
            requirements: Vec::new(),
            cooldown_ms: ATTACK_AD_COOLDOWN_MS,
            effect: EffectSpec::Probabilistic {
                branches: vec![
                    OutcomeBranch {
                        weight: ATTACK_AD_SUCCESS_WEIGHT,
                        label: "success".to_string(),
                        actor: StatDelta::default(),
                        target: StatDelta {
                            approval: -ATTACK_AD_APPROVAL_HIT,
                            ..StatDelta::default()
                        },
                        message: "The attack ad landed.".to_string(),
                    },
                    OutcomeBranch {
                        weight: ATTACK_AD_BACKFIRE_WEIGHT,
                        label: "backfire".to_string(),
                        actor: StatDelta {
                            approval: -ATTACK_AD_BACKFIRE_HIT,
                            ..StatDelta::default()
                        },
                        target: StatDelta::default(),
                        message: "The attack ad backfired.".to_string(),
                    },
                ],
            },
        },
        ActionDefinition {
            id: SUPPORT_ACTION.to_string(),
            name: "Endorsement".to_string(),
            category: ActionCategory::TargetedSupport,
            base_cost: ActionCost {
                action_points: ENDORSEMENT_AP_COST,
                political_capital: ENDORSEMENT_PC_COST,
                ..ActionCost::default()
            },
            scaling: None,
            requirements: Vec::new(),
            cooldown_ms: 0,
            effect: EffectSpec::Deterministic {
                actor: StatDelta::default(),
                target: StatDelta {
                    approval: ENDORSEMENT_APPROVAL_GAIN,
                    ..StatDelta::default()
                },
                message: "Endorsed a fellow candidate.".to_string(),
            },
        },
    ]
}
