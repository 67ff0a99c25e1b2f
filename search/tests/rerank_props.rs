use proptest::prelude::*;
use search::keywords::QuerySignals;
use search::rerank::{rerank, Candidate};

fn candidates() -> impl Strategy<Value = Vec<Candidate>> {
    prop::collection::vec(
        (0.0f64..1.0, prop::sample::subsequence(vec!["go", "rust", "java"], 0..3)),
        1..20,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (similarity, languages))| Candidate {
                developer_id: format!("dev{:02}", i),
                similarity,
                languages: languages.into_iter().map(String::from).collect(),
                domains: Vec::new(),
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn no_signals_is_similarity_order(list in candidates()) {
        let ranked = rerank(&QuerySignals::default(), list);
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].0.similarity >= pair[1].0.similarity);
            prop_assert_eq!(pair[0].1, pair[0].0.similarity);
        }
    }

    #[test]
    fn match_outranks_equal_similarity(similarity in 0.0f64..1.0) {
        let signals = QuerySignals {
            languages: ["go".to_string()].into(),
            domains: ["backend".to_string()].into(),
        };
        let plain = Candidate {
            developer_id: "a-plain".to_owned(),
            similarity,
            languages: vec!["java".to_owned()],
            domains: vec!["frontend".to_owned()],
        };
        let matching = Candidate {
            developer_id: "z-match".to_owned(),
            similarity,
            languages: vec!["go".to_owned()],
            domains: vec!["backend".to_owned()],
        };
        let ranked = rerank(&signals, vec![plain, matching]);
        prop_assert_eq!(ranked[0].0.developer_id.as_str(), "z-match");
        prop_assert!(ranked[0].1 > ranked[1].1);
    }
}
