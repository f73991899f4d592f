use std::fmt;

use sha2::{Digest, Sha256};

use crate::route::tree::{MoleculeNode, ReactionNode, RouteTree};

const MOLECULE_TAG: u8 = b'M';
const REACTION_TAG: u8 = b'R';

/// SHA-256 digest of a route's structure.
///
/// Two trees hash equal when they have the same node labels and the same
/// shape, regardless of sibling order. Used as the cost memoization key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteHash([u8; 32]);

impl RouteHash {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for RouteHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

pub(crate) fn structural_hash(tree: &RouteTree) -> RouteHash {
    RouteHash(molecule_digest(tree.root()))
}

fn update_label(hasher: &mut Sha256, label: &[u8]) {
    hasher.update((label.len() as u64).to_le_bytes());
    hasher.update(label);
}

fn finish(mut hasher: Sha256, mut child_digests: Vec<[u8; 32]>) -> [u8; 32] {
    child_digests.sort_unstable();
    hasher.update((child_digests.len() as u64).to_le_bytes());
    for digest in &child_digests {
        hasher.update(digest);
    }
    hasher.finalize().into()
}

fn molecule_digest(node: &MoleculeNode) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([MOLECULE_TAG]);
    update_label(&mut hasher, node.smiles.as_bytes());
    update_label(&mut hasher, node.stock_key().as_bytes());
    hasher.update([u8::from(node.in_stock)]);
    finish(hasher, node.children.iter().map(reaction_digest).collect())
}

fn reaction_digest(node: &ReactionNode) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([REACTION_TAG]);
    update_label(&mut hasher, node.template().unwrap_or_default().as_bytes());
    update_label(&mut hasher, node.smiles.as_bytes());
    finish(hasher, node.children.iter().map(molecule_digest).collect())
}
