use eframe::egui::{self, Key, Ui};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Tree Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Start from a person")
            .on_hover_text("Name or identifier. Starting a new tree clears the current one.");
        let search_response = ui.text_edit_singleline(&mut self.search);
        let submitted =
            search_response.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter));

        let mut start = submitted;
        let mut clear = false;
        ui.horizontal(|ui| {
            start |= ui.button("Start tree").clicked();
            clear = ui.button("Clear").clicked();
        });
        if start && !self.search.trim().is_empty() {
            let term = self.search.trim().to_owned();
            self.seed(&term);
        }
        if clear {
            self.hovered = None;
            self.controller.reset();
        }

        ui.separator();
        self.draw_selection_actions(ui);

        ui.separator();
        let mut state = self.controller.state().borrow_mut();
        let mut live = state.physics_enabled();
        if ui
            .checkbox(&mut live, "Live physics simulation")
            .on_hover_text("Run the force layout and genealogical constraints every frame.")
            .changed()
        {
            state.set_physics_enabled(live);
        }

        ui.collapsing("Physics tuning", |ui| {
            let physics = state.physics_mut();
            ui.add(
                egui::Slider::new(&mut physics.intensity, 0.2..=2.5)
                    .text("Intensity")
                    .clamping(egui::SliderClamping::Always),
            );
            ui.add(
                egui::Slider::new(&mut physics.repulsion_scale, 0.25..=2.6)
                    .text("Repulsion")
                    .clamping(egui::SliderClamping::Always),
            );
            ui.add(
                egui::Slider::new(&mut physics.spring_scale, 0.2..=2.2)
                    .text("Springs")
                    .clamping(egui::SliderClamping::Always),
            );
            ui.add(
                egui::Slider::new(&mut physics.collision_scale, 0.2..=2.0)
                    .text("Collision")
                    .clamping(egui::SliderClamping::Always),
            );
            ui.add(
                egui::Slider::new(&mut physics.velocity_damping, 0.78..=0.97)
                    .text("Velocity damping")
                    .clamping(egui::SliderClamping::Always),
            );
        });
        drop(state);

        ui.separator();
        ui.small("Click a person to trace their bloodline, a couple to show or hide children.");
        ui.small("P pins the selection, D or Delete removes it, Esc clears it.");
    }

    fn draw_selection_actions(&mut self, ui: &mut Ui) {
        let selected = self
            .controller
            .state()
            .borrow()
            .selected()
            .map(str::to_owned);
        let Some(selected) = selected else {
            ui.label("Nothing selected.");
            return;
        };

        ui.horizontal_wrapped(|ui| {
            if ui.button("Pin / unpin").clicked() {
                self.controller.toggle_pin(&selected);
            }
            if ui.button("Remove").clicked() {
                self.controller.delete(&selected);
            }
            if ui.button("Clear selection").clicked() {
                self.controller.clear_selection();
            }
        });
    }
}
