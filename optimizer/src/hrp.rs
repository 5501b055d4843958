//! Hierarchical Risk Parity (§4.3 step 7): the terminal, always-feasible
//! fallback. Single-linkage clustering over a correlation-derived distance,
//! quasi-diagonal seriation of the resulting tree, then inverse-variance
//! recursive bisection down the tree — the classical HRP construction
//! (Lopez de Prado), with no per-security or group constraints applied.

#[derive(Debug, Clone)]
struct ClusterNode {
    indices: Vec<usize>,
    left: Option<usize>,
    right: Option<usize>,
}

fn correlation_from_covariance(cov: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = cov.len();
    let std_dev: Vec<f64> = (0..n).map(|i| cov[i][i].max(0.0).sqrt()).collect();
    (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    let denom = std_dev[i] * std_dev[j];
                    if denom < 1e-12 {
                        0.0
                    } else {
                        (cov[i][j] / denom).clamp(-1.0, 1.0)
                    }
                })
                .collect()
        })
        .collect()
}

fn distance_from_correlation(corr: &[Vec<f64>]) -> Vec<Vec<f64>> {
    corr.iter()
        .map(|row| row.iter().map(|rho| (0.5 * (1.0 - rho)).max(0.0).sqrt()).collect())
        .collect()
}

fn cluster_distance(dist: &[Vec<f64>], a: &[usize], b: &[usize]) -> f64 {
    a.iter()
        .flat_map(|&i| b.iter().map(move |&j| dist[i][j]))
        .fold(f64::INFINITY, f64::min)
}

fn build_single_linkage_tree(dist: &[Vec<f64>], n: usize) -> Vec<ClusterNode> {
    let mut nodes: Vec<ClusterNode> = (0..n)
        .map(|i| ClusterNode {
            indices: vec![i],
            left: None,
            right: None,
        })
        .collect();
    let mut active: Vec<usize> = (0..n).collect();

    while active.len() > 1 {
        let mut best = (0usize, 1usize, f64::INFINITY);
        for ai in 0..active.len() {
            for bi in (ai + 1)..active.len() {
                let d = cluster_distance(dist, &nodes[active[ai]].indices, &nodes[active[bi]].indices);
                if d < best.2 {
                    best = (ai, bi, d);
                }
            }
        }
        let (ai, bi, _) = best;
        let a = active[ai];
        let b = active[bi];
        let mut merged = nodes[a].indices.clone();
        merged.extend(nodes[b].indices.clone());
        let new_id = nodes.len();
        nodes.push(ClusterNode {
            indices: merged,
            left: Some(a),
            right: Some(b),
        });
        let (lo, hi) = if ai < bi { (ai, bi) } else { (bi, ai) };
        active.remove(hi);
        active.remove(lo);
        active.push(new_id);
    }
    nodes
}

fn quasi_diagonal_order(nodes: &[ClusterNode], root: usize) -> Vec<usize> {
    match (nodes[root].left, nodes[root].right) {
        (Some(left), Some(right)) => {
            let mut order = quasi_diagonal_order(nodes, left);
            order.extend(quasi_diagonal_order(nodes, right));
            order
        }
        _ => nodes[root].indices.clone(),
    }
}

/// Inverse-variance portfolio variance of the sub-cluster at `positions`
/// (indices into `order`).
fn cluster_variance(positions: &[usize], order: &[usize], cov: &[Vec<f64>]) -> f64 {
    let members: Vec<usize> = positions.iter().map(|&p| order[p]).collect();
    let inverse_variance: Vec<f64> = members.iter().map(|&i| 1.0 / cov[i][i].max(1e-12)).collect();
    let total: f64 = inverse_variance.iter().sum();
    let weights: Vec<f64> = inverse_variance.iter().map(|v| v / total).collect();

    let mut variance = 0.0;
    for (a, &ia) in members.iter().enumerate() {
        for (b, &ib) in members.iter().enumerate() {
            variance += weights[a] * weights[b] * cov[ia][ib];
        }
    }
    variance
}

fn recursive_bisection(order: &[usize], cov: &[Vec<f64>]) -> Vec<f64> {
    let n = order.len();
    let mut weights = vec![1.0; n];
    let mut pending: Vec<Vec<usize>> = vec![(0..n).collect()];

    while let Some(cluster) = pending.pop() {
        if cluster.len() <= 1 {
            continue;
        }
        let mid = cluster.len() / 2;
        let left = cluster[..mid].to_vec();
        let right = cluster[mid..].to_vec();

        let variance_left = cluster_variance(&left, order, cov);
        let variance_right = cluster_variance(&right, order, cov);
        let total_variance = variance_left + variance_right;
        let left_factor = if total_variance < 1e-12 {
            0.5
        } else {
            1.0 - variance_left / total_variance
        };

        for &position in &left {
            weights[position] *= left_factor;
        }
        for &position in &right {
            weights[position] *= 1.0 - left_factor;
        }

        pending.push(left);
        pending.push(right);
    }
    weights
}

/// Always-feasible HRP allocation over `cov`. Never fails: a single-asset
/// covariance matrix degenerates to a weight of `1.0`.
pub fn hrp_weights(cov: &[Vec<f64>]) -> Vec<f64> {
    let n = cov.len();
    if n <= 1 {
        return vec![1.0; n];
    }
    let correlation = correlation_from_covariance(cov);
    let distance = distance_from_correlation(&correlation);
    let nodes = build_single_linkage_tree(&distance, n);
    let root = nodes.len() - 1;
    let order = quasi_diagonal_order(&nodes, root);
    let weights_by_position = recursive_bisection(&order, cov);

    let mut weights = vec![0.0; n];
    for (position, &original_index) in order.iter().enumerate() {
        weights[original_index] = weights_by_position[position];
    }
    weights
}
