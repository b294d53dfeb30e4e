use eframe::egui::{self, Align, Context, Layout};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn show(&mut self, ctx: &Context) {
        self.tick(ctx);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("árvore");
                    ui.separator();
                    ui.label(format!("dataset: {} people", self.people));
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.status_text());
                        if self.controller.state().borrow().is_busy() {
                            ui.spinner();
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.controller.state().borrow().store().is_empty() {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Search for a person to start a tree.");
                });
            } else {
                self.draw_graph(ui);
            }
        });
    }

    fn status_text(&self) -> String {
        let state = self.controller.state().borrow();
        let store = state.store();
        let people = store.nodes().iter().filter(|node| node.is_person()).count();
        let mut text = format!("people: {people}  edges: {}", store.edges().len());
        if state.loading_count() > 0 {
            text.push_str(&format!("  loading: {}", state.loading_count()));
        }
        text
    }
}
