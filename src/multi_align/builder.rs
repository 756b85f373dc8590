//! Progressive multi-alignment building: pick a root, walk the spanning
//! tree, and glue each structure into a single growing [`Group`] in that
//! order, optionally refining each glue (`spec.md` §4.7).

use std::collections::VecDeque;

use crate::align::{refine_join, AlignScoring, Alignment};
use crate::error::Error;
use crate::scoring::{self, ScoreFormula};
use crate::view::ViewCache;

use super::group::Group;
use super::spanning_tree::{maximum_spanning_tree, Edge};

/// How aggressively each glue step is refined after the raw pairwise
/// alignment is spliced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GlueStyle {
    /// Splice the pairwise alignment in as-is.
    Simply,
    /// After splicing, re-run [`refine_join`] once between the newly joined
    /// structure and its attachment point, using the group's current state,
    /// and re-splice the refined result.
    IncrementallyWithPairRefining,
    /// After every glue, additionally run one bounded pass of `spec.md`
    /// §4.6's "refine-all": every standard split (one member versus the
    /// rest) is refined and re-spliced if doing so improves the group's
    /// total residue score.
    WithHeavyRefining,
}

/// How the spanning tree's root structure (the one every other structure's
/// positions are ultimately expressed relative to) is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RootPolicy {
    /// `spec.md` §9's placeholder heuristic: start from the lower-indexed
    /// endpoint of the spanning tree's single heaviest edge.
    HeaviestEdgeEndpoint,
}

/// The finished multi-alignment: the canonical-order `Alignment` (entry `i`
/// is structure `i` of the input) and the spanning tree actually used to
/// build it.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiAlignResult {
    pub alignment: Alignment,
    pub tree: Vec<Edge>,
    pub root: usize,
}

/// Build a multi-structure alignment for structures `0..n`.
///
/// `pairwise_scores` is every known pairwise SSAP score (used only to pick
/// the spanning tree); `pairwise_alignment(a, b)` must return the 2-entry
/// pairwise `Alignment` between structures `a` and `b` (entry 0 = `a`,
/// entry 1 = `b`), computed however the caller likes (typically a prior
/// `ssap::align_pair` pass). `view_caches[i]` is structure `i`'s view cache,
/// needed for refinement.
pub fn build_multi_alignment(
    n: usize,
    pairwise_scores: &[Edge],
    pairwise_alignment: impl Fn(usize, usize) -> Result<Alignment, Error>,
    view_caches: &[ViewCache],
    root_policy: RootPolicy,
    glue_style: GlueStyle,
    scoring_cfg: &AlignScoring,
) -> Result<MultiAlignResult, Error> {
    if n == 0 {
        return Err(Error::InvalidArgument(
            "cannot build a multi-alignment over zero structures".into(),
        ));
    }
    if view_caches.len() != n {
        return Err(Error::InvalidArgument(format!(
            "{} view caches given for {n} structures",
            view_caches.len()
        )));
    }
    if n == 1 {
        let group = Group::singleton(0, view_caches[0].len());
        return Ok(MultiAlignResult {
            alignment: group.into_canonical_alignment(&[0])?,
            tree: Vec::new(),
            root: 0,
        });
    }

    let tree = maximum_spanning_tree(n, pairwise_scores)?;
    let RootPolicy::HeaviestEdgeEndpoint = root_policy;
    let root = tree[0].0.min(tree[0].1);

    let order = bfs_glue_order(n, &tree, root);

    let mut group = Group::singleton(root, view_caches[root].len());
    for (existing, new) in order {
        let aln_ab = pairwise_alignment(existing, new)?;
        let entry_a_in_self = group
            .local_index(existing)
            .ok_or_else(|| Error::Runtime(format!("structure {existing} should already be in the group")))?;
        group.glue_in_alignment(&aln_ab, entry_a_in_self, new)?;

        if matches!(glue_style, GlueStyle::IncrementallyWithPairRefining | GlueStyle::WithHeavyRefining) {
            refine_last_glue(&mut group, existing, new, view_caches, scoring_cfg)?;
        }
        if matches!(glue_style, GlueStyle::WithHeavyRefining) {
            refine_all_once(&mut group, view_caches, scoring_cfg)?;
        }
    }

    let canonical_order: Vec<usize> = (0..n).collect();
    let alignment = group.into_canonical_alignment(&canonical_order)?;
    Ok(MultiAlignResult { alignment, tree, root })
}

/// Breadth-first traversal of the spanning tree from `root`, yielding
/// `(already-glued structure, newly-discovered structure)` pairs in the
/// order each new structure should be folded into the group.
fn bfs_glue_order(n: usize, tree: &[Edge], root: usize) -> Vec<(usize, usize)> {
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
    for &(a, b, _) in tree {
        adjacency[a].push(b);
        adjacency[b].push(a);
    }
    let mut visited = vec![false; n];
    visited[root] = true;
    let mut queue = VecDeque::from([root]);
    let mut order = Vec::new();
    while let Some(node) = queue.pop_front() {
        let mut neighbours = adjacency[node].clone();
        neighbours.sort_unstable();
        for next in neighbours {
            if !visited[next] {
                visited[next] = true;
                order.push((node, next));
                queue.push_back(next);
            }
        }
    }
    order
}

fn view_caches_in_group_order(group: &Group, view_caches: &[ViewCache]) -> Vec<ViewCache> {
    group.entries().iter().map(|&structure| view_caches[structure].clone()).collect()
}

fn total_score(group: &Group, view_caches: &[ViewCache], formula: ScoreFormula) -> Result<f64, Error> {
    let ordered = view_caches_in_group_order(group, view_caches);
    let mut alignment = group.alignment().clone();
    scoring::score_alignment(&mut alignment, &ordered, formula)?;
    Ok(alignment
        .rows()
        .iter()
        .filter_map(|row| (0..alignment.num_entries()).find_map(|e| row.score(e)))
        .sum())
}

/// Re-run [`refine_join`] on the single-entry split `{existing}` vs
/// `{new}` within the group's current state, and re-splice the refined
/// pairwise alignment in place of the one just glued.
fn refine_last_glue(
    group: &mut Group,
    existing: usize,
    new: usize,
    view_caches: &[ViewCache],
    scoring_cfg: &AlignScoring,
) -> Result<(), Error> {
    let side_a = [group.local_index(existing).expect("existing is in the group")];
    let side_b = [group.local_index(new).expect("new was just glued in")];
    let ordered = view_caches_in_group_order(group, view_caches);
    let refined = refine_join(group.alignment(), &side_a, &side_b, &ordered, scoring_cfg)?;

    group.drop_entry(new)?;
    let entry_a_in_self = group.local_index(existing).expect("existing survives dropping new");
    group.glue_in_alignment(&refined, entry_a_in_self, new)?;
    Ok(())
}

/// One bounded pass of "refine-all": for every member, refine the split
/// `{member}` vs "everyone else" and keep the result only if it improves
/// the group's total residue score.
fn refine_all_once(group: &mut Group, view_caches: &[ViewCache], scoring_cfg: &AlignScoring) -> Result<(), Error> {
    let formula = scoring_cfg.formula;
    let mut baseline = total_score(group, view_caches, formula)?;
    for &member in group.entries().to_vec().iter() {
        let Some(member_local) = group.local_index(member) else {
            continue;
        };
        let Some(representative) = group.entries().iter().copied().find(|&e| e != member) else {
            continue;
        };
        let representative_local = group.local_index(representative).expect("representative is a member");

        let ordered = view_caches_in_group_order(group, view_caches);
        let refined = refine_join(group.alignment(), &[member_local], &[representative_local], &ordered, scoring_cfg)?;

        let mut candidate = group.clone();
        candidate.drop_entry(member)?;
        let anchor_local = candidate
            .local_index(representative)
            .expect("representative survives dropping member");
        candidate.glue_in_alignment(&refined, anchor_local, member)?;

        let candidate_score = total_score(&candidate, view_caches, formula)?;
        if candidate_score > baseline {
            *group = candidate;
            baseline = candidate_score;
        }
    }
    Ok(())
}
