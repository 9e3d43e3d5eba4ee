/// Entity names recognised out of the box, in match order.
pub const DEFAULT_ENTITIES: &[&str] = &[
    "Luke Skywalker",
    "Darth Vader",
    "Leia Organa",
    "Han Solo",
    "Yoda",
    "Obi-Wan Kenobi",
    "Anakin Skywalker",
    "Palpatine",
    "Chewbacca",
    "R2-D2",
    "C-3PO",
    "Padmé Amidala",
    "Tatooine",
    "Alderaan",
    "Hoth",
    "Dagobah",
    "Endor",
    "Death Star",
    "Millennium Falcon",
    "X-wing",
];

/// Closed, ordered vocabulary of entity names.
///
/// Matching is a case-insensitive substring test with no word boundaries,
/// so "Hoth" is found inside "Hothouse". Output follows gazetteer order,
/// not the order terms appear in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gazetteer {
    /// (original, lowercased) pairs
    entries: Vec<(String, String)>,
}

impl Gazetteer {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .map(|t| {
                let folded = t.to_lowercase();
                (t, folded)
            })
            .collect();

        Self { entries }
    }

    pub fn extract(&self, text: &str) -> Vec<String> {
        let haystack = text.to_lowercase();

        self.entries
            .iter()
            .filter(|(_, folded)| haystack.contains(folded.as_str()))
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Gazetteer {
    fn default() -> Self {
        Self::new(DEFAULT_ENTITIES)
    }
}
