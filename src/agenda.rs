use std::{collections::BTreeSet, fmt, ops::Index};

use indexmap::IndexMap;

use crate::{
    diagact::DialogAct,
    error::AgendaError,
    types::{Annotation, AnnotationKey},
};

/// Stack of the user's not-yet-expressed intentions.
///
/// The last entry is the top of the stack. Entries are keyed by [`AnnotationKey`], so two
/// equal annotations never coexist: pushing one that is already present moves it to the
/// top instead of duplicating it.
#[derive(Debug, Clone, Default)]
pub struct Agenda {
    stack: IndexMap<AnnotationKey, Annotation>,
}

impl Agenda {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, annotation: Annotation) {
        let key = annotation.key();
        self.stack.shift_remove(&key);
        self.stack.insert(key, annotation);
    }

    /// Pushes each annotation in order; later items end up higher in the stack.
    pub fn push_all<I>(&mut self, annotations: I)
    where
        I: IntoIterator<Item = Annotation>,
    {
        for annotation in annotations {
            self.push(annotation);
        }
    }

    /// Pops up to `number_of_items` annotations from the top.
    ///
    /// Unless `multi_diagact` is set, popping stops as soon as the next annotation has a
    /// different dialogue act than the first one popped. The result keeps the stack's
    /// bottom-to-top order.
    pub fn pop(&mut self, number_of_items: usize, multi_diagact: bool) -> Vec<Annotation> {
        let mut popped = Vec::new();
        let first_act = self.peek().map(|annotation| annotation.diagact);

        while popped.len() < number_of_items {
            let Some(top) = self.peek() else {
                break;
            };
            if !multi_diagact && Some(top.diagact) != first_act {
                break;
            }
            match self.stack.pop() {
                Some((_, annotation)) => popped.push(annotation),
                None => break,
            }
        }

        tracing::debug!(count = popped.len(), remaining = self.len(), "popped from agenda");
        popped.reverse();
        popped
    }

    pub fn peek(&self) -> Option<&Annotation> {
        self.stack.last().map(|(_, annotation)| annotation)
    }

    pub fn remove_annotation(&mut self, annotation: &Annotation) -> Result<Annotation, AgendaError> {
        self.stack
            .shift_remove(&annotation.key())
            .ok_or_else(|| AgendaError::NotFound(annotation.to_string()))
    }

    /// Rebuilds the agenda without the annotations at the given positions.
    ///
    /// Positions are bottom-to-top, as returned by [`Agenda::search_agenda`]. Duplicate
    /// positions are allowed; out-of-range positions are rejected before anything is removed.
    pub fn remove_by_index<I>(&mut self, indices: I) -> Result<(), AgendaError>
    where
        I: IntoIterator<Item = usize>,
    {
        let indices: BTreeSet<usize> = indices.into_iter().collect();
        if let Some(&out_of_range) = indices.iter().find(|&&index| index >= self.len()) {
            return Err(AgendaError::InvalidArgument(format!(
                "index {out_of_range} is out of range for agenda of length {}",
                self.len()
            )));
        }
        if indices.is_empty() {
            return Ok(());
        }

        let stack = std::mem::take(&mut self.stack);
        self.stack = stack
            .into_iter()
            .enumerate()
            .filter(|(index, _)| !indices.contains(index))
            .map(|(_, entry)| entry)
            .collect();
        Ok(())
    }

    /// Bottom-to-top positions of annotations with `diagact` that, when `goal_slot` is
    /// given, also mention that slot.
    pub fn search_agenda(&self, diagact: DialogAct, goal_slot: Option<&str>) -> Vec<usize> {
        self.iter()
            .enumerate()
            .filter(|(_, annotation)| annotation.diagact == diagact)
            .filter(|(_, annotation)| goal_slot.map_or(true, |slot| annotation.mentions_slot(slot)))
            .map(|(index, _)| index)
            .collect()
    }

    pub fn get(&self, index: usize) -> Option<&Annotation> {
        self.stack.get_index(index).map(|(_, annotation)| annotation)
    }

    pub fn contains(&self, annotation: &Annotation) -> bool {
        self.stack.contains_key(&annotation.key())
    }

    /// Iterates bottom-to-top.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Annotation> + ExactSizeIterator {
        self.stack.values()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }
}

impl Index<usize> for Agenda {
    type Output = Annotation;

    fn index(&self, index: usize) -> &Self::Output {
        &self.stack[index]
    }
}

impl fmt::Display for Agenda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for annotation in self.iter().rev() {
            writeln!(f, "{annotation}")?;
        }
        Ok(())
    }
}
