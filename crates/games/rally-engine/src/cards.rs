use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use rally_core::cards::{ProgramCard, Rotate};

/// Draw and discard piles for one match. When the draw pile runs dry the
/// discard pile is reshuffled into it.
#[derive(Debug, Clone)]
pub struct Deck {
    draw: Vec<ProgramCard>,
    discard: Vec<ProgramCard>,
}

impl Deck {
    /// The standard 84-card deck, shuffled.
    pub fn standard(rng: &mut StdRng) -> Self {
        let mut draw = standard_cards();
        draw.shuffle(rng);
        Self {
            draw,
            discard: Vec::new(),
        }
    }

    pub fn draw(&mut self, rng: &mut StdRng) -> Option<ProgramCard> {
        if self.draw.is_empty() {
            self.discard.shuffle(rng);
            std::mem::swap(&mut self.draw, &mut self.discard);
        }
        self.draw.pop()
    }

    pub fn discard(&mut self, card: ProgramCard) {
        self.discard.push(card);
    }

    pub fn discard_all(&mut self, cards: impl IntoIterator<Item = ProgramCard>) {
        self.discard.extend(cards);
    }

    pub fn remaining(&self) -> usize {
        self.draw.len() + self.discard.len()
    }
}

/// Card distribution of the physical deck: priorities are unique across
/// all 84 cards.
fn standard_cards() -> Vec<ProgramCard> {
    let mut cards = Vec::with_capacity(84);
    for i in 0..6 {
        cards.push(ProgramCard::rotation(10 + i * 10, Rotate::UTurn));
    }
    for i in 0..18 {
        cards.push(ProgramCard::rotation(70 + i * 20, Rotate::Left));
        cards.push(ProgramCard::rotation(80 + i * 20, Rotate::Right));
    }
    for i in 0..6 {
        cards.push(ProgramCard::movement(430 + i * 10, -1));
    }
    for i in 0..18 {
        cards.push(ProgramCard::movement(490 + i * 10, 1));
    }
    for i in 0..12 {
        cards.push(ProgramCard::movement(670 + i * 10, 2));
    }
    for i in 0..6 {
        cards.push(ProgramCard::movement(790 + i * 10, 3));
    }
    cards
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn standard_deck_composition() {
        let cards = standard_cards();
        assert_eq!(cards.len(), 84);

        let count = |f: &dyn Fn(&ProgramCard) -> bool| cards.iter().filter(|c| f(c)).count();
        assert_eq!(count(&|c| c.rotate == Rotate::UTurn), 6);
        assert_eq!(count(&|c| c.rotate == Rotate::Left), 18);
        assert_eq!(count(&|c| c.rotate == Rotate::Right), 18);
        assert_eq!(count(&|c| c.distance == -1), 6);
        assert_eq!(count(&|c| c.distance == 1), 18);
        assert_eq!(count(&|c| c.distance == 2), 12);
        assert_eq!(count(&|c| c.distance == 3), 6);
    }

    #[test]
    fn priorities_are_unique_and_valid() {
        let cards = standard_cards();
        let priorities: HashSet<u32> = cards.iter().map(|c| c.priority).collect();
        assert_eq!(priorities.len(), cards.len(), "No two cards share a priority");
        for card in &cards {
            card.validate().unwrap();
        }
    }

    #[test]
    fn deck_reshuffles_discard_when_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut deck = Deck::standard(&mut rng);

        let mut drawn = Vec::new();
        for _ in 0..84 {
            drawn.push(deck.draw(&mut rng).unwrap());
        }
        assert!(deck.draw(&mut rng).is_none(), "Both piles empty");

        deck.discard_all(drawn);
        assert_eq!(deck.remaining(), 84);
        assert!(deck.draw(&mut rng).is_some(), "Reshuffled from discard");
    }

    #[test]
    fn same_seed_same_order() {
        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        let mut deck_a = Deck::standard(&mut rng_a);
        let mut deck_b = Deck::standard(&mut rng_b);
        for _ in 0..20 {
            assert_eq!(deck_a.draw(&mut rng_a), deck_b.draw(&mut rng_b));
        }
    }
}
