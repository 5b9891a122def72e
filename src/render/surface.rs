use super::StudentCard;

/// The output area cards are drawn into.
pub trait RenderSurface {
    fn clear(&mut self);
    fn append(&mut self, card: StudentCard);
}

impl<T: RenderSurface + ?Sized> RenderSurface for &mut T {
    fn clear(&mut self) {
        (**self).clear()
    }

    fn append(&mut self, card: StudentCard) {
        (**self).append(card)
    }
}

// keeps every card in memory, used for reports and tests
#[derive(Clone, Debug, Default)]
pub struct CardBuffer {
    cards: Vec<StudentCard>,
    clears: usize,
}

impl CardBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cards(&self) -> &[StudentCard] {
        &self.cards
    }

    pub fn into_cards(self) -> Vec<StudentCard> {
        self.cards
    }

    pub fn clears(&self) -> usize {
        self.clears
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl RenderSurface for CardBuffer {
    fn clear(&mut self) {
        self.cards.clear();
        self.clears += 1;
    }

    fn append(&mut self, card: StudentCard) {
        self.cards.push(card);
    }
}
