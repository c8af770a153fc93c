use crate::editor::NetworkEditorUi;
use crate::simulation::SimulationPanel;
use eframe::egui::{self, RichText};

use super::state::{AppTab, TrafficDashboardApp};
use super::widgets::{PrimaryButton, solid_section_header};

mod layout;
mod status;
mod toolbar;
