use eframe::egui::{RichText, Ui};

use arvore::util::unwrap_label;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let state = self.controller.state().borrow();
        let Some(selected_id) = state.selected() else {
            ui.label("Select a person on the tree.");
            return;
        };
        let Some(node) = state.store().node(selected_id) else {
            ui.label("Selected person no longer exists in the tree.");
            return;
        };
        let Some(person) = node.as_person() else {
            return;
        };

        ui.label(RichText::new(unwrap_label(&person.label)).strong());
        ui.small(selected_id);
        ui.add_space(6.0);

        ui.label(format!("Gender: {}", person.gender.label()));
        if let Some(life_span) = &person.life_span {
            ui.label(format!("Life span: {life_span}"));
        }
        if node.pinned {
            ui.label("Pinned");
        }
        if state.is_loading(selected_id) {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Fetching family...");
            });
        }

        let Some(record) = state.session().record(selected_id) else {
            return;
        };
        ui.separator();
        let family = &record.family;
        for (title, relatives) in [
            ("Parents", family.parents.iter().collect::<Vec<_>>()),
            ("Spouses", family.spouses.iter().collect()),
            ("Siblings", record.siblings().collect()),
            ("Children", family.children.iter().map(|child| &child.person).collect()),
        ] {
            if relatives.is_empty() {
                continue;
            }
            ui.label(RichText::new(title).strong());
            for relative in relatives {
                let shown = state.store().contains(&relative.id);
                let text = if shown {
                    relative.label.clone()
                } else {
                    format!("{} (hidden)", relative.label)
                };
                ui.small(text);
            }
            ui.add_space(4.0);
        }
    }
}
