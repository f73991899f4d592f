use std::collections::HashMap;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::route::extraction::Templates;
use crate::route::hash::{RouteHash, structural_hash};
use crate::types::RetroMineError;

/// Molecule node of a route tree.
///
/// Leaves are starting materials; inner molecules are intermediates made by
/// their child reaction.
#[derive(Debug, Clone, PartialEq)]
pub struct MoleculeNode {
    /// Canonical structure string
    pub smiles: String,
    /// Precomputed stock-lookup key, when the search output carries one
    pub inchi_key: Option<String>,
    /// Whether the molecule is available from stock
    pub in_stock: bool,
    /// Reactions producing this molecule
    pub children: Vec<ReactionNode>,
}

impl MoleculeNode {
    /// Creates a molecule without child reactions.
    pub fn leaf(smiles: impl Into<String>, in_stock: bool) -> Self {
        Self {
            smiles: smiles.into(),
            inchi_key: None,
            in_stock,
            children: Vec::new(),
        }
    }

    /// Creates an intermediate produced by `reaction`.
    pub fn made_by(smiles: impl Into<String>, reaction: ReactionNode) -> Self {
        Self {
            smiles: smiles.into(),
            inchi_key: None,
            in_stock: false,
            children: vec![reaction],
        }
    }

    /// Sets the stock-lookup key.
    #[must_use]
    pub fn with_inchi_key(mut self, key: impl Into<String>) -> Self {
        self.inchi_key = Some(key.into());
        self
    }

    /// Key used to look the molecule up in a stock table.
    ///
    /// Falls back to the structure string when no key was persisted.
    #[must_use]
    pub fn stock_key(&self) -> &str {
        self.inchi_key.as_deref().unwrap_or(&self.smiles)
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// A molecule is solved when every leaf below it is in stock.
    #[must_use]
    pub fn is_solved(&self) -> bool {
        if self.is_leaf() {
            return self.in_stock;
        }
        self.children
            .iter()
            .all(|reaction| reaction.children.iter().all(Self::is_solved))
    }

    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a MoleculeNode>) {
        if self.is_leaf() {
            leaves.push(self);
            return;
        }
        for reaction in &self.children {
            for molecule in &reaction.children {
                molecule.collect_leaves(leaves);
            }
        }
    }

    fn collect_reactions<'a>(&'a self, reactions: &mut Vec<&'a ReactionNode>) {
        for reaction in &self.children {
            reactions.push(reaction);
            for molecule in &reaction.children {
                molecule.collect_reactions(reactions);
            }
        }
    }
}

/// Reaction annotations carried by a reaction node.
///
/// Known keys are typed; everything else the search wrote is kept verbatim
/// in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionMetadata {
    /// Reaction template applied at this step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Reaction classification label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    /// Policy or route source that proposed the step
    #[serde(rename = "policy_name", skip_serializing_if = "Option::is_none")]
    pub provenance: Option<String>,
    /// Remaining metadata entries
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reaction node of a route tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionNode {
    /// Reaction structure string (may be empty)
    pub smiles: String,
    pub metadata: ReactionMetadata,
    /// Precursor molecules
    pub children: Vec<MoleculeNode>,
}

impl ReactionNode {
    /// Creates a reaction annotated with `template`.
    pub fn new(template: impl Into<String>, children: Vec<MoleculeNode>) -> Self {
        Self {
            smiles: String::new(),
            metadata: ReactionMetadata {
                template: Some(template.into()),
                ..Default::default()
            },
            children,
        }
    }

    #[must_use]
    pub fn template(&self) -> Option<&str> {
        self.metadata.template.as_deref()
    }
}

/// One candidate synthesis route to a target molecule.
///
/// Owned children make every tree acyclic with a single root.
///
/// # Examples
///
/// ```rust
/// use retromine_core::route::{MoleculeNode, ReactionNode, RouteTree};
///
/// let tree = RouteTree::new(MoleculeNode::made_by(
///     "CCO",
///     ReactionNode::new("[C:1]O>>[C:1]Br", vec![MoleculeNode::leaf("CCBr", true)]),
/// ));
///
/// assert!(tree.is_solved());
/// assert_eq!(tree.reaction_count(), 1);
/// assert_eq!(tree.templates().collect::<Vec<_>>(), vec!["[C:1]O>>[C:1]Br"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RouteTree {
    root: MoleculeNode,
}

impl RouteTree {
    pub fn new(root: MoleculeNode) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &MoleculeNode {
        &self.root
    }

    /// Parses a tree from its persisted JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`RetroMineError::InvalidRoute`] when molecule and reaction
    /// nodes do not alternate, and [`RetroMineError::Json`] for missing or
    /// mistyped fields.
    pub fn from_value(value: Value) -> Result<Self, RetroMineError> {
        let wire = WireNode::deserialize(value)?;
        Ok(Self::new(MoleculeNode::try_from(wire)?))
    }

    /// Persisted JSON form of the tree.
    #[must_use]
    pub fn to_value(&self) -> Value {
        wire_molecule(&self.root)
    }

    /// A tree is solved when every leaf molecule is in stock.
    #[must_use]
    pub fn is_solved(&self) -> bool {
        self.root.is_solved()
    }

    /// Leaf molecules in depth-first order.
    #[must_use]
    pub fn leaves(&self) -> Vec<&MoleculeNode> {
        let mut leaves = Vec::new();
        self.root.collect_leaves(&mut leaves);
        leaves
    }

    /// Reaction nodes in depth-first order.
    #[must_use]
    pub fn reactions(&self) -> Vec<&ReactionNode> {
        let mut reactions = Vec::new();
        self.root.collect_reactions(&mut reactions);
        reactions
    }

    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.leaves().len()
    }

    #[must_use]
    pub fn reaction_count(&self) -> usize {
        self.reactions().len()
    }

    /// Every reaction template in the tree, one per annotated step.
    pub fn templates(&self) -> Templates<'_> {
        Templates::new(&self.root)
    }

    /// Digest identifying the tree's structure independent of child order.
    #[must_use]
    pub fn structural_hash(&self) -> RouteHash {
        structural_hash(self)
    }
}

/// Node layout of persisted search output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
enum WireNode {
    #[serde(rename = "mol")]
    Molecule {
        smiles: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        inchi_key: Option<String>,
        #[serde(default)]
        in_stock: bool,
        #[serde(default)]
        children: Vec<WireNode>,
    },
    #[serde(rename = "reaction")]
    Reaction {
        #[serde(default)]
        smiles: Value,
        #[serde(default)]
        metadata: ReactionMetadata,
        #[serde(default)]
        children: Vec<WireNode>,
    },
}

impl TryFrom<WireNode> for MoleculeNode {
    type Error = RetroMineError;

    fn try_from(node: WireNode) -> Result<Self, Self::Error> {
        match node {
            WireNode::Molecule {
                smiles,
                inchi_key,
                in_stock,
                children,
            } => Ok(Self {
                smiles,
                inchi_key,
                in_stock,
                children: children
                    .into_iter()
                    .map(ReactionNode::try_from)
                    .collect::<Result<_, _>>()?,
            }),
            WireNode::Reaction { .. } => Err(RetroMineError::InvalidRoute(
                "expected a molecule node, found a reaction node".to_string(),
            )),
        }
    }
}

impl TryFrom<WireNode> for ReactionNode {
    type Error = RetroMineError;

    fn try_from(node: WireNode) -> Result<Self, Self::Error> {
        match node {
            WireNode::Reaction {
                smiles,
                metadata,
                children,
            } => Ok(Self {
                smiles: reaction_smiles(smiles)?,
                metadata,
                children: children
                    .into_iter()
                    .map(MoleculeNode::try_from)
                    .collect::<Result<_, _>>()?,
            }),
            WireNode::Molecule { smiles, .. } => Err(RetroMineError::InvalidRoute(format!(
                "expected a reaction node, found molecule '{smiles}'"
            ))),
        }
    }
}

/// Reaction structures are persisted either as one string or as a list of
/// precursor strings.
fn reaction_smiles(value: Value) -> Result<String, RetroMineError> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(smiles) => Ok(smiles),
        Value::Array(parts) => parts
            .into_iter()
            .map(|part| match part {
                Value::String(smiles) => Ok(smiles),
                other => Err(RetroMineError::InvalidRoute(format!(
                    "reaction structure list contains a non-string entry: {other}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|parts| parts.join(".")),
        other => Err(RetroMineError::InvalidRoute(format!(
            "reaction structure must be a string or list of strings, found {other}"
        ))),
    }
}

fn wire_molecule(node: &MoleculeNode) -> Value {
    let wire = WireNode::Molecule {
        smiles: node.smiles.clone(),
        inchi_key: node.inchi_key.clone(),
        in_stock: node.in_stock,
        children: Vec::new(),
    };
    let mut value = serde_json::to_value(wire).unwrap_or(Value::Null);
    if let Value::Object(map) = &mut value {
        map.insert(
            "children".to_string(),
            Value::Array(node.children.iter().map(wire_reaction).collect()),
        );
    }
    value
}

fn wire_reaction(node: &ReactionNode) -> Value {
    let wire = WireNode::Reaction {
        smiles: Value::String(node.smiles.clone()),
        metadata: node.metadata.clone(),
        children: Vec::new(),
    };
    let mut value = serde_json::to_value(wire).unwrap_or(Value::Null);
    if let Value::Object(map) = &mut value {
        map.insert(
            "children".to_string(),
            Value::Array(node.children.iter().map(wire_molecule).collect()),
        );
    }
    value
}

impl Serialize for RouteTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RouteTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = WireNode::deserialize(deserializer)?;
        MoleculeNode::try_from(wire)
            .map(Self::new)
            .map_err(de::Error::custom)
    }
}

/// Accepts a flat list of trees or the nested `[[tree, ...]]` layout that
/// tabular search exports produce.
fn deserialize_trees<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<RouteTree>, D::Error> {
    trees_from_value(Value::deserialize(deserializer)?).map_err(de::Error::custom)
}

fn trees_from_value(value: Value) -> Result<Vec<RouteTree>, RetroMineError> {
    let values = match value {
        Value::Array(values) => values,
        other => {
            return Err(RetroMineError::InvalidRoute(format!(
                "route trees must be a list, found {other}"
            )));
        }
    };
    let mut trees = Vec::with_capacity(values.len());
    for value in values {
        match value {
            Value::Array(inner) => {
                for tree in inner {
                    trees.push(RouteTree::from_value(tree)?);
                }
            }
            tree => trees.push(RouteTree::from_value(tree)?),
        }
    }
    Ok(trees)
}

/// Candidate routes found for one target molecule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRoutes {
    /// Target structure string
    pub target: String,
    /// Candidate routes, in search output order
    #[serde(default, deserialize_with = "deserialize_trees")]
    pub trees: Vec<RouteTree>,
}

impl TargetRoutes {
    pub fn new(target: impl Into<String>, trees: Vec<RouteTree>) -> Self {
        Self {
            target: target.into(),
            trees,
        }
    }

    /// A target is solved when at least one of its routes is.
    #[must_use]
    pub fn is_solved(&self) -> bool {
        self.trees.iter().any(RouteTree::is_solved)
    }

    pub fn solved_trees(&self) -> impl Iterator<Item = &RouteTree> + '_ {
        self.trees.iter().filter(|tree| tree.is_solved())
    }
}

/// Route search results for a set of targets.
///
/// Targets are unique; when the same target appears twice only the first
/// record is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteBatch {
    targets: Vec<TargetRoutes>,
    index: HashMap<String, usize>,
}

impl RouteBatch {
    pub fn new(targets: impl IntoIterator<Item = TargetRoutes>) -> Self {
        let mut batch = Self::default();
        for target in targets {
            batch.push(target);
        }
        batch
    }

    /// Adds a target record, returning `false` if the target was already present.
    pub fn push(&mut self, target: TargetRoutes) -> bool {
        if self.index.contains_key(&target.target) {
            log::debug!("Dropping duplicate record for target {}", target.target);
            return false;
        }
        self.index.insert(target.target.clone(), self.targets.len());
        self.targets.push(target);
        true
    }

    #[must_use]
    pub fn targets(&self) -> &[TargetRoutes] {
        &self.targets
    }

    #[must_use]
    pub fn get(&self, target: &str) -> Option<&TargetRoutes> {
        self.index.get(target).map(|&position| &self.targets[position])
    }

    pub fn solved_targets(&self) -> impl Iterator<Item = &TargetRoutes> + '_ {
        self.targets.iter().filter(|target| target.is_solved())
    }

    /// Every candidate route of every target.
    pub fn all_trees(&self) -> impl Iterator<Item = &RouteTree> + '_ {
        self.targets.iter().flat_map(|target| target.trees.iter())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Builds a batch from persisted JSON.
    ///
    /// Accepts a list of `{"target", "trees"}` records, a list of
    /// single-entry `{target: [trees]}` objects, or one object mapping
    /// targets to their trees.
    ///
    /// # Errors
    ///
    /// Returns [`RetroMineError::InvalidRoute`] for any other shape or for
    /// trees whose nodes do not alternate, and [`RetroMineError::Json`] for
    /// mistyped node fields.
    pub fn from_value(value: Value) -> Result<Self, RetroMineError> {
        let mut targets = Vec::new();
        match value {
            Value::Array(items) => {
                for item in items {
                    let is_record = item.get("target").is_some();
                    match item {
                        Value::Object(record) if is_record => {
                            targets.push(target_from_record(record)?);
                        }
                        Value::Object(map) => targets_from_map(map, &mut targets)?,
                        other => {
                            return Err(RetroMineError::InvalidRoute(format!(
                                "route batch entries must be objects, found {other}"
                            )));
                        }
                    }
                }
            }
            Value::Object(map) => targets_from_map(map, &mut targets)?,
            other => {
                return Err(RetroMineError::InvalidRoute(format!(
                    "route batch must be a list or an object, found {other}"
                )));
            }
        }
        Ok(Self::new(targets))
    }
}

fn targets_from_map(
    map: Map<String, Value>,
    targets: &mut Vec<TargetRoutes>,
) -> Result<(), RetroMineError> {
    for (target, trees) in map {
        targets.push(TargetRoutes::new(target, trees_from_value(trees)?));
    }
    Ok(())
}

/// `{"target": ..., "trees": [...]}`; other keys are ignored.
fn target_from_record(mut record: Map<String, Value>) -> Result<TargetRoutes, RetroMineError> {
    let target = match record.remove("target") {
        Some(Value::String(target)) => target,
        other => {
            return Err(RetroMineError::InvalidRoute(format!(
                "target record needs a string 'target', found {}",
                other.unwrap_or(Value::Null)
            )));
        }
    };
    let trees = match record.remove("trees") {
        Some(trees) => trees_from_value(trees)?,
        None => Vec::new(),
    };
    Ok(TargetRoutes::new(target, trees))
}

impl Serialize for RouteBatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.targets.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RouteBatch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(de::Error::custom)
    }
}
