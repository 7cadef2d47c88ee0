/// Built-in screening beliefs, grouped the way the admin dashboard reports them.
pub const DEFAULT_BELIEFS_YAML: &str = r#"
categories:
  - name: incentive
    description: the user's motivating factors and perceived benefits associated with cancer screening.
    beliefs:
      - key: increase_cure
        statement: screening for colorectal cancer increases the chance of a cure
      - key: increase_lifespan
        statement: screening for colorectal cancer can help them live longer
      - key: gain_reassurance
        statement: a screening test would give them peace of mind
      - key: gain_control
        statement: getting screened gives them more control over their health
  - name: vulnerability
    description: the user's perception of their susceptibility to developing colorectal cancer.
    beliefs:
      - key: family_medical_history
        statement: their family medical history puts them at risk of colorectal cancer
      - key: own_medical_history
        statement: their own medical history puts them at risk of colorectal cancer
      - key: risk_factor_exposure
        statement: their lifestyle exposes them to risk factors for colorectal cancer
      - key: observed_symptoms
        statement: they have noticed symptoms that could be related to colorectal cancer
  - name: barriers
    description: how convenient cancer screening is for the user, based on their perceived obstacles and challenges.
    beliefs:
      - key: financial_concerns
        statement: screening is too expensive for them
      - key: discomfort_and_side_effects
        statement: screening is uncomfortable or has unpleasant side effects
      - key: time_constraints
        statement: they do not have the time to get screened
      - key: social_embarrassment
        statement: getting screened would be embarrassing
      - key: tendency_to_deny
        statement: they would rather not know whether they have colorectal cancer
      - key: difficult_preparation
        statement: preparing for a screening test is too difficult
"#;
