use rand::{rngs::StdRng, seq::index, Rng, SeedableRng};

use crate::error::Error;
use crate::record::FEATURE_COUNT;

use super::dataset::{Dataset, Row};

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        /// Fraction of positive rows that reached this leaf.
        positive: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// Fully grown CART tree on gini impurity. Each split only considers
/// `max_features` randomly chosen columns.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
    root: Node,
}

struct TreeBuilder<'a> {
    rows: &'a [Row],
    labels: &'a [u8],
    max_features: usize,
    rng: StdRng,
}

impl DecisionTree {
    pub fn fit(
        rows: &[Row],
        labels: &[u8],
        sample: Vec<usize>,
        max_features: usize,
        seed: u64,
    ) -> Self {
        let mut builder = TreeBuilder {
            rows,
            labels,
            max_features: max_features.clamp(1, FEATURE_COUNT),
            rng: StdRng::seed_from_u64(seed),
        };
        Self {
            root: builder.build(sample),
        }
    }

    /// Probability of the positive class for one scaled row.
    pub fn predict_proba(&self, row: &Row) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { positive } => return *positive,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn depth(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        depth(&self.root)
    }
}

fn gini(positives: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let p = positives as f64 / total as f64;
    2.0 * p * (1.0 - p)
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl TreeBuilder<'_> {
    fn positives(&self, sample: &[usize]) -> usize {
        sample.iter().filter(|&&i| self.labels[i] == 1).count()
    }

    fn build(&mut self, sample: Vec<usize>) -> Node {
        let total = sample.len();
        let positives = self.positives(&sample);
        let leaf = Node::Leaf {
            positive: if total == 0 {
                0.0
            } else {
                positives as f64 / total as f64
            },
        };
        if total < 2 || positives == 0 || positives == total {
            return leaf;
        }

        let Some(best) = self.best_split(&sample, positives) else {
            return leaf;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = sample
            .into_iter()
            .partition(|&i| self.rows[i][best.feature] <= best.threshold);
        Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left: Box::new(self.build(left)),
            right: Box::new(self.build(right)),
        }
    }

    /// Weighted child impurity must beat the parent's, otherwise no split.
    fn best_split(&mut self, sample: &[usize], positives: usize) -> Option<BestSplit> {
        let total = sample.len();
        let parent = gini(positives, total);
        let mut best: Option<BestSplit> = None;

        let features = index::sample(&mut self.rng, FEATURE_COUNT, self.max_features);
        let mut order: Vec<usize> = sample.to_vec();
        for feature in features.iter() {
            order.sort_by(|&a, &b| {
                self.rows[a][feature]
                    .total_cmp(&self.rows[b][feature])
                    .then(a.cmp(&b))
            });

            let mut left_pos = 0;
            for k in 1..total {
                if self.labels[order[k - 1]] == 1 {
                    left_pos += 1;
                }
                let lo = self.rows[order[k - 1]][feature];
                let hi = self.rows[order[k]][feature];
                if lo == hi {
                    continue;
                }

                let impurity = (k as f64 * gini(left_pos, k)
                    + (total - k) as f64 * gini(positives - left_pos, total - k))
                    / total as f64;
                if impurity < parent - 1e-12
                    && best.as_ref().map_or(true, |b| impurity < b.impurity)
                {
                    let mut threshold = lo + (hi - lo) / 2.0;
                    // midpoint can round up to `hi` for adjacent floats
                    if threshold >= hi {
                        threshold = lo;
                    }
                    best = Some(BestSplit {
                        feature,
                        threshold,
                        impurity,
                    });
                }
            }
        }
        best
    }
}

/// Bagged ensemble of decision trees.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Every tree gets a bootstrap sample and its own seed derived from
    /// `seed`, so the forest is reproducible.
    pub fn fit(data: &Dataset, n_estimators: usize, seed: u64) -> Result<Self, Error> {
        if n_estimators == 0 {
            return Err(Error::Dataset("n_estimators must be greater than 0".into()));
        }
        if data.is_empty() {
            return Err(Error::Dataset("Cannot fit forest on zero rows".into()));
        }

        let n = data.len();
        let max_features = (FEATURE_COUNT as f64).sqrt().floor() as usize;
        let mut rng = StdRng::seed_from_u64(seed);
        let trees = (0..n_estimators)
            .map(|_| {
                let sample: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
                let tree_seed: u64 = rng.random();
                DecisionTree::fit(&data.features, &data.labels, sample, max_features, tree_seed)
            })
            .collect();
        Ok(Self { trees })
    }

    /// Mean of the per-tree positive fractions.
    pub fn predict_proba(&self, row: &Row) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict_proba(row)).sum();
        (sum / self.trees.len() as f64).clamp(0.0, 1.0)
    }

    /// 1 iff the positive probability is strictly greater than the negative.
    pub fn predict(&self, row: &Row) -> u8 {
        u8::from(self.predict_proba(row) > 0.5)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn max_depth(&self) -> usize {
        self.trees.iter().map(DecisionTree::depth).max().unwrap_or(0)
    }
}
