//! crates/doc_analysis_core/src/templates.rs
//!
//! The template bank: every canned paragraph, list and question the analysis
//! pipeline draws from. Nothing in here looks at a real document.

use crate::domain::FaqExample;

/// Placeholder document bodies. An accepted upload receives one of these.
pub const SAMPLE_PARAGRAPHS: [&str; 3] = [
    "Renewable energy has been growing rapidly over the past decade, driven by technological advances and policy support. Solar photovoltaic and wind energy costs have fallen dramatically, making them competitive with fossil fuels in many markets. Governments worldwide are implementing policies and incentives to accelerate the transition to clean energy. However, significant challenges remain in energy storage, grid integration, and maintaining reliability as renewable penetration increases. The intermittent nature of solar and wind power requires sophisticated grid management and backup systems. Investment in battery storage technology and smart grid infrastructure is essential for the continued growth of renewable energy. Despite these challenges, the renewable energy sector continues to attract substantial investment and shows strong growth potential.",
    "Digital transformation has become a critical priority for organizations across all industries. The COVID-19 pandemic accelerated digital adoption, forcing companies to rapidly implement remote work technologies and digital customer engagement platforms. Successful digital transformation requires more than just technology implementation; it demands cultural change, leadership commitment, and employee engagement. Organizations must focus on change management, training programs, and clear communication to ensure successful adoption. Key areas of focus include cloud migration, data analytics, artificial intelligence, and automation. Companies that successfully navigate digital transformation typically see improved operational efficiency, enhanced customer experience, and increased competitive advantage. However, the journey is complex and requires careful planning, adequate resources, and ongoing commitment from leadership.",
    "Supply chain optimization has become increasingly important in today's global economy. Companies are seeking to reduce costs, improve efficiency, and enhance resilience in their supply chain operations. Key strategies include supplier diversification, inventory optimization, demand forecasting, and technology integration. The use of artificial intelligence and machine learning in supply chain management is growing, enabling better demand prediction and automated decision-making. Sustainability considerations are also becoming more important, with companies focusing on reducing environmental impact and ensuring ethical sourcing practices. Risk management is another critical aspect, particularly in light of recent global disruptions. Companies are investing in supply chain visibility tools and developing contingency plans to mitigate potential disruptions.",
];

pub const DETAILED_OPENING: &str =
    "This document provides a comprehensive examination of the subject matter.";

pub const DETAILED_CLOSING: &str = "The analysis reveals multiple interconnected factors that contribute to the overall understanding of the topic. Each aspect builds upon previous points to create a complete picture of the current situation and future implications. The document presents evidence-based conclusions supported by relevant data and expert insights.";

pub const HIGHLIGHTS: [&str; 5] = [
    "• Primary focus area shows significant growth and development",
    "• Key challenges identified require strategic attention",
    "• Technology integration presents both opportunities and risks",
    "• Investment and resource allocation are critical success factors",
    "• Future outlook remains positive with proper implementation",
];

pub const BULLET_POINTS: [&str; 5] = [
    "• Main topic shows rapid growth and development",
    "• Technology costs have decreased significantly",
    "• Government support through policies and incentives",
    "• Challenges remain in implementation and infrastructure",
    "• Investment continues to grow in this sector",
];

pub const SIMPLIFIED_VERSION: &str = "This document talks about important changes happening in this field. The main idea is that things are getting better, but there are still some problems to solve. New technology is helping, but it costs money and takes time to set up. Companies and governments are working together to make improvements. The future looks good if everyone keeps working on these issues.";

pub const FAQ_BLOCK: &str = "Here are the most commonly asked questions about this topic:\n\nQ: What are the main benefits?\nA: The primary benefits include cost reduction, improved efficiency, and better outcomes.\n\nQ: What challenges exist?\nA: Main challenges include implementation costs, technical complexity, and change management.\n\nQ: What's the timeline for results?\nA: Most organizations see initial results within 6-12 months of implementation.\n\nQ: How much investment is required?\nA: Investment varies by organization size and scope, but ROI is typically achieved within 18-24 months.";

pub const CUSTOM_BOILERPLATE: &str = "The document addresses your specific question by providing relevant information and context. The key points that relate to your request include the main themes, supporting evidence, and practical implications discussed in the document.";

/// How many characters of the document a custom request echoes back.
pub const CUSTOM_EXCERPT_CHARS: usize = 200;

const FAQ_EXAMPLES: [(&str, &str); 2] = [
    (
        "What are the main points covered in this document?",
        "The document covers key developments, challenges, and future outlook in the subject area, with emphasis on practical implications and strategic considerations.",
    ),
    (
        "How can this information be applied practically?",
        "The insights can be used for strategic planning, decision-making, and understanding current trends and future opportunities in the field.",
    ),
];

/// The two example questions attached to every analysis result.
pub fn faq_examples() -> Vec<FaqExample> {
    FAQ_EXAMPLES
        .iter()
        .map(|(question, answer)| FaqExample {
            question: question.to_string(),
            answer: answer.to_string(),
        })
        .collect()
}

pub const AUDIO_OUTRO: &str = "That covers the main points from your analysis. Thanks for listening.";

pub fn audio_intro(kind_label: &str) -> String {
    format!("Here's your {} for this document. ", kind_label.to_lowercase())
}

/// The acknowledgement given to a follow-up question when no answering
/// backend is configured.
pub fn canned_follow_up_answer(question: &str) -> String {
    format!(
        "Thanks for your question: \"{}\". Based on the analysis above, the document's main themes, supporting evidence, and practical implications are the best place to look for an answer.",
        question.trim()
    )
}
