use super::map::BeliefMap;
use super::score::{BeliefScore, ScoreRound};

const HEADER: &str = "Notes about the user's health beliefs, inferred from the conversation so far:";

fn phrase(score: BeliefScore, statement: &str) -> String {
    match score {
        BeliefScore::Affirm => format!("The user believes that {}.", statement),
        BeliefScore::Disagree => format!("The user does not believe that {}.", statement),
        BeliefScore::Unknown => {
            format!("It is unknown whether the user believes that {}.", statement)
        }
    }
}

/// Renders a round as one sentence per belief, in map order.
///
/// Output depends only on the map and the round, so the same round always
/// yields the same prompt.
pub fn render_belief_prompt(beliefs: &BeliefMap, round: &ScoreRound) -> String {
    let mut lines = Vec::with_capacity(beliefs.len() + 1);
    lines.push(HEADER.to_string());
    for belief in beliefs.beliefs() {
        lines.push(phrase(round.get(&belief.key), &belief.statement));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beliefs() -> BeliefMap {
        BeliefMap::from_yaml(
            "categories:\n  - name: c\n    beliefs:\n      - { key: zeta, statement: screening is cheap }\n      - { key: alpha, statement: screening hurts }\n      - { key: mid, statement: cancer runs in the family }\n",
        )
        .unwrap()
    }

    #[test]
    fn renders_each_score_with_its_phrasing_in_map_order() {
        let map = beliefs();
        let mut round = ScoreRound::seeded(&map);
        round.set("zeta", BeliefScore::Affirm);
        round.set("alpha", BeliefScore::Disagree);

        let prompt = render_belief_prompt(&map, &round);
        let lines: Vec<&str> = prompt.lines().collect();

        assert_eq!(lines[0], HEADER);
        assert_eq!(lines[1], "The user believes that screening is cheap.");
        assert_eq!(lines[2], "The user does not believe that screening hurts.");
        assert_eq!(
            lines[3],
            "It is unknown whether the user believes that cancer runs in the family."
        );
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn rendering_is_deterministic() {
        let map = BeliefMap::builtin().unwrap();
        let round = ScoreRound::seeded(&map);
        assert_eq!(
            render_belief_prompt(&map, &round),
            render_belief_prompt(&map, &round.clone())
        );
    }
}
