//! Landing screen content

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Feature {
    pub title: &'static str,
    pub body: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct HomeView {
    pub title: &'static str,
    pub tagline: &'static str,
    pub summary: &'static str,
    pub features: Vec<Feature>,
    pub steps: Vec<&'static str>,
    /// Primary call to action and the path it leads to
    pub cta: (&'static str, &'static str),
}

impl Default for HomeView {
    fn default() -> Self {
        Self {
            title: "PLINKS",
            tagline: "1-Click Payment Links for Polkadot Asset Hub",
            summary: "PLINKS makes it easy to request and receive payments using Polkadot's Asset Hub. \
                      Generate shareable payment links for DOT and other tokens that anyone can pay with a single click.",
            features: vec![
                Feature {
                    title: "Simple Links",
                    body: "Generate shareable payment links with specified recipient, amount, and token type.",
                },
                Feature {
                    title: "Easy Sharing",
                    body: "Share links via email, text messages, or social media with anyone.",
                },
                Feature {
                    title: "One-Click Payments",
                    body: "Recipients can connect their wallet and complete the payment in one click.",
                },
            ],
            steps: vec![
                "Create a payment link with recipient address, amount, and token type",
                "Share the link with the payer",
                "The payer opens the link, connects a wallet and confirms",
                "Check the request status with its Request ID",
            ],
            cta: ("Create Payment Link", "/create"),
        }
    }
}

impl HomeView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain-text rendering for terminals
    pub fn render_text(&self) -> String {
        let mut out = format!("{}\n{}\n\n{}\n\n", self.title, self.tagline, self.summary);
        for feature in &self.features {
            out.push_str(&format!("* {}: {}\n", feature.title, feature.body));
        }
        out.push('\n');
        for (i, step) in self.steps.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, step));
        }
        out
    }
}
