use serde::Serialize;

use super::map::BeliefMap;
use super::score::ScoreRound;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeliefSeries {
    pub key: String,
    pub label: String,
    pub scores: Vec<i8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySeries {
    pub name: String,
    pub description: String,
    /// Mean score of the category's beliefs, one entry per round.
    pub averages: Vec<f64>,
    pub beliefs: Vec<BeliefSeries>,
}

/// Health belief monitoring view over a score history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryReport {
    pub rounds: usize,
    pub categories: Vec<CategorySeries>,
}

impl CategoryReport {
    pub fn build(beliefs: &BeliefMap, rounds: &[ScoreRound]) -> Self {
        let categories = beliefs
            .categories()
            .iter()
            .map(|category| {
                let series: Vec<BeliefSeries> = category
                    .keys
                    .iter()
                    .map(|key| BeliefSeries {
                        key: key.clone(),
                        label: beliefs.statement(key).unwrap_or(key).to_string(),
                        scores: rounds.iter().map(|round| round.get(key).value()).collect(),
                    })
                    .collect();

                let averages = (0..rounds.len())
                    .map(|idx| {
                        if series.is_empty() {
                            return 0.0;
                        }
                        let total: i32 = series.iter().map(|s| i32::from(s.scores[idx])).sum();
                        f64::from(total) / series.len() as f64
                    })
                    .collect();

                CategorySeries {
                    name: category.name.clone(),
                    description: category.description.clone(),
                    averages,
                    beliefs: series,
                }
            })
            .collect();

        Self {
            rounds: rounds.len(),
            categories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beliefs::score::BeliefScore;

    const YAML: &str = r#"
categories:
  - name: incentive
    description: how much the user expects to gain
    beliefs:
      - { key: a, statement: screening helps }
      - { key: b, statement: screening reassures }
  - name: barriers
    beliefs:
      - { key: c, statement: screening is expensive }
"#;

    #[test]
    fn averages_each_category_per_round() {
        let map = BeliefMap::from_yaml(YAML).unwrap();
        let first = ScoreRound::seeded(&map);
        let mut second = ScoreRound::seeded(&map);
        second.set("a", BeliefScore::Affirm);
        second.set("c", BeliefScore::Disagree);
        let mut third = second.clone();
        third.set("b", BeliefScore::Affirm);

        let report = CategoryReport::build(&map, &[first, second, third]);

        assert_eq!(report.rounds, 3);
        let incentive = &report.categories[0];
        assert_eq!(incentive.averages, vec![0.0, 0.5, 1.0]);
        assert_eq!(incentive.beliefs[0].label, "screening helps");
        assert_eq!(incentive.beliefs[1].scores, vec![0, 0, 1]);
        assert_eq!(report.categories[1].averages, vec![0.0, -1.0, -1.0]);
        assert_eq!(report.categories[1].description, "");
    }

    #[test]
    fn empty_history_has_empty_series() {
        let map = BeliefMap::from_yaml(YAML).unwrap();
        let report = CategoryReport::build(&map, &[]);

        assert_eq!(report.rounds, 0);
        assert_eq!(report.categories.len(), 2);
        assert!(report.categories[0].averages.is_empty());
        assert!(report.categories[0].beliefs[0].scores.is_empty());
    }
}
