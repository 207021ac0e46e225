use std::time::Duration;

use eframe::{egui, Frame};
use egui::Context;

use reqwest::blocking::Client;
use reqwest::Result;

const API: &str = "http://127.0.0.1:5000";

/// Distribution choice on the UI side, sent as its lowercase name.
#[derive(Debug, Clone, Copy, PartialEq)]
enum DistributionMode {
    Zipf,
    Poisson,
}

impl DistributionMode {
    fn as_query(&self) -> &'static str {
        match self {
            DistributionMode::Zipf => "zipf",
            DistributionMode::Poisson => "poisson",
        }
    }
}

/// REST context holding a reusable blocking HTTP client.
struct RESTContext {
    client: Client,
}

impl RESTContext {
    /// Creates a new REST context with a timeout.
    fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::new(5, 0))
            .build()?;
        Ok(Self { client })
    }

    /// Sends a GET request to `/v1/generate` with query parameters.
    ///
    /// Error statuses are returned as text too: the body names the problem
    /// (unknown category, exhausted batch...).
    fn get_generated(&self, params: &[(String, String)]) -> Result<String> {
        let response = self.client
            .get(format!("{API}/v1/generate"))
            .query(params)
            .send()?;

        response.text()
    }

    /// Sends a GET request to `/v1/phonologies`.
    fn get_phonologies(&self) -> Result<String> {
        let response = self.client
            .get(format!("{API}/v1/phonologies"))
            .send()?
            .error_for_status()?;

        response.text()
    }

    /// Sends a GET request to `/v1/loaded_phonology`.
    fn get_loaded_phonology(&self) -> Result<String> {
        let response = self.client
            .get(format!("{API}/v1/loaded_phonology"))
            .send()?
            .error_for_status()?;

        response.text()
    }

    /// Sends a PUT request to `/v1/load_phonology`.
    fn put_load_phonology(&self, name: &str) -> Result<String> {
        let response = self.client
            .put(format!("{API}/v1/load_phonology"))
            .query(&[("name", name)])
            .send()?
            .error_for_status()?;

        response.text()
    }
}

/// Global UI state (MUST persist between frames in egui).
struct GeneratorUI {
    rest: RESTContext,
    output: Option<String>,

    selected_phonology: String,
    available_phonologies: Vec<String>,

    words: usize,
    syllables: usize,
    distribution: DistributionMode,
    alpha: bool,
    dedup: bool,

    use_seed: bool,
    seed: u64,
}

impl GeneratorUI {
    /// Initializes the UI with the server's current state.
    fn new() -> Result<Self> {
        let mut generator = Self {
            rest: RESTContext::new()?,
            output: None,

            selected_phonology: String::new(),
            available_phonologies: Vec::new(),

            words: 10,
            syllables: 2,
            distribution: DistributionMode::Zipf,
            alpha: true,
            dedup: true,

            use_seed: false,
            seed: 42,
        };
        generator.get_phonologies();
        generator.get_loaded_phonology();
        Ok(generator)
    }

    /// Builds the query parameters for the API.
    ///
    /// The seed is only sent when enabled.
    fn build_query(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("words".into(), self.words.to_string()),
            ("syllables".into(), self.syllables.to_string()),
            ("distribution".into(), self.distribution.as_query().to_string()),
            ("alpha".into(), self.alpha.to_string()),
            ("dedup".into(), self.dedup.to_string()),
        ];

        if self.use_seed {
            params.push(("seed".into(), self.seed.to_string()));
        }

        params
    }

    /// Performs the generation request.
    fn get_generated(&mut self) {
        let params = self.build_query();
        match self.rest.get_generated(&params) {
            Ok(text) => self.output = Some(text),
            Err(e) => self.output = Some(format!("Error: {e}")),
        }
    }

    /// Performs the list phonologies request.
    fn get_phonologies(&mut self) {
        match self.rest.get_phonologies() {
            Ok(text) => {
                self.available_phonologies = text
                    .lines()
                    .map(|s| s.trim().to_owned())
                    .filter(|s| !s.is_empty())
                    .collect()
            }
            Err(e) => self.output = Some(format!("Error: {e}")),
        }
    }

    /// Performs the current phonology request.
    fn get_loaded_phonology(&mut self) {
        match self.rest.get_loaded_phonology() {
            Ok(name) => self.selected_phonology = name.trim().to_owned(),
            Err(e) => self.output = Some(format!("Error: {e}")),
        }
    }

    /// Performs the load phonology request.
    fn put_load_phonology(&mut self, name: &str) {
        match self.rest.put_load_phonology(name) {
            Ok(text) => self.output = Some(text),
            Err(e) => self.output = Some(format!("Error: {e}")),
        }
    }
}

impl eframe::App for GeneratorUI {
    /// UI update loop (called every frame).
    fn update(&mut self, ctx: &Context, _: &mut Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let previous_phonology = self.selected_phonology.clone();

            egui::Grid::new("generator_grid")
                .num_columns(2)
                .spacing([20.0, 6.0])
                .striped(true)
                .show(ui, |ui| {
                    ui.label("Phonology");
                    egui::ComboBox::from_id_salt("phonology")
                        .selected_text(&self.selected_phonology)
                        .show_ui(ui, |ui| {
                            for name in &self.available_phonologies {
                                ui.selectable_value(&mut self.selected_phonology, name.clone(), name);
                            }
                        });
                    ui.end_row();

                    ui.label("Words");
                    ui.add(egui::DragValue::new(&mut self.words).range(1..=500).speed(1));
                    ui.end_row();

                    ui.label("Syllables per word");
                    ui.add(egui::DragValue::new(&mut self.syllables).range(1..=8).speed(1));
                    ui.end_row();

                    ui.label("Distribution");
                    ui.horizontal(|ui| {
                        ui.radio_value(&mut self.distribution, DistributionMode::Zipf, "Zipf");
                        ui.radio_value(&mut self.distribution, DistributionMode::Poisson, "Poisson");
                    });
                    ui.end_row();

                    ui.label("Alphabetize");
                    ui.checkbox(&mut self.alpha, "");
                    ui.end_row();

                    ui.label("Distinct words only");
                    ui.checkbox(&mut self.dedup, "");
                    ui.end_row();

                    ui.checkbox(&mut self.use_seed, "Fixed seed");
                    if self.use_seed {
                        ui.add(egui::DragValue::new(&mut self.seed));
                    } else {
                        ui.label("Random output");
                    }
                    ui.end_row();

                    ui.separator();
                    ui.end_row();

                    if ui
                        .add_sized([200.0, 40.0], egui::Button::new("Generate"))
                        .clicked()
                    {
                        self.get_generated();
                    }
                    ui.end_row();
                });

            // Switch the server's phonology when the selection changed
            if self.selected_phonology != previous_phonology {
                let name = self.selected_phonology.clone();
                self.put_load_phonology(&name);
            }

            ui.separator();
            egui::ScrollArea::vertical().show(ui, |ui| {
                match &self.output {
                    Some(text) => ui.label(text),
                    None => ui.label("Click Generate to start"),
                };
            });
        });
    }
}

/// Application entry point.
fn main() -> eframe::Result {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([440.0, 520.0])
            .with_resizable(true),
        ..Default::default()
    };

    eframe::run_native(
        "wz-generator",
        options,
        Box::new(|_| Ok(Box::new(GeneratorUI::new()?))),
    )
}
