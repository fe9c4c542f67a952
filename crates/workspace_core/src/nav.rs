//! Tab strip with a "More" overflow menu.

/// Navigation items split into a visible strip and a "More" overflow menu.
#[derive(Debug, Clone)]
pub struct NavOverflow<T> {
    items: Vec<T>,
    visible_count: usize,
    visible: Vec<usize>,
}

impl<T: PartialEq> NavOverflow<T> {
    pub fn new(items: Vec<T>, visible_count: usize) -> Self {
        let visible = (0..items.len().min(visible_count)).collect();
        Self {
            items,
            visible_count,
            visible,
        }
    }

    pub fn visible(&self) -> Vec<&T> {
        self.visible.iter().map(|&index| &self.items[index]).collect()
    }

    /// Overflow entries, kept in their original navigation order.
    pub fn overflow(&self) -> Vec<&T> {
        self.items
            .iter()
            .enumerate()
            .filter(|(index, _)| !self.visible.contains(index))
            .map(|(_, item)| item)
            .collect()
    }

    pub fn badge_count(&self) -> usize {
        self.items.len() - self.visible.len()
    }

    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.items.iter().position(|candidate| candidate == item)
    }

    /// Selects `item`. An overflow item replaces the last visible one, which
    /// moves into the overflow menu. Returns `false` for unknown items.
    pub fn select(&mut self, item: &T) -> bool {
        let Some(index) = self.index_of(item) else {
            return false;
        };
        if self.visible.contains(&index) {
            return true;
        }
        if self.visible_count == 0 {
            return false;
        }
        self.visible.pop();
        self.visible.push(index);
        true
    }
}
