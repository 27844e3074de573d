//! The fixed list of exhibits shown in the hall.
//!
//! Exhibit content is developer-authored and compiled in. `TrustedMarkup`
//! nodes are passed to the detail view verbatim, which is only sound while
//! this list stays out of third-party hands. The builtin exhibits are fully
//! structured; `TrustedMarkup` is there for authored rich text that has no
//! structured form.

use crate::error::{HallError, HallResult};

/// Seating plan that overrides declared positions, by exhibit index
pub const SEATING_PLAN: [(f64, f64); 7] = [
    (-12.0, -12.0),
    (0.0, -12.0),
    (12.0, -12.0),
    (-12.0, 0.0),
    (0.0, 0.0),
    (12.0, 0.0),
    (0.0, 12.0),
];

/// Position on the floor plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub z: f64,
}

/// A labelled hyperlink inside exhibit content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub label: String,
    pub href: String,
}

/// Structured exhibit content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentNode {
    Heading { level: u8, text: String },
    Paragraph(String),
    /// Secondary line such as a company, year or tech stack
    Caption(String),
    Field { label: String, value: String },
    List(Vec<String>),
    Tags(Vec<String>),
    Links(Vec<Link>),
    Section { title: String, children: Vec<ContentNode> },
    /// Rich text kept as authored
    TrustedMarkup(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Exhibit {
    pub id: String,
    pub title: String,
    pub category: String,
    pub short_description: String,
    pub content: Vec<ContentNode>,
    pub icon: String,
    /// Where the exhibit stands after the seating plan is applied
    pub position: Placement,
    /// Where the content declares it should stand
    pub declared: Placement,
    pub index: usize,
}

/// Position for an exhibit: the seating plan when it has a slot, else its own
pub fn layout_position(index: usize, declared: Placement) -> Placement {
    SEATING_PLAN
        .get(index)
        .map(|&(x, z)| Placement { x, z })
        .unwrap_or(declared)
}

/// Read-only, ordered exhibit records
#[derive(Debug, Clone)]
pub struct ContentStore {
    exhibits: Vec<Exhibit>,
}

impl ContentStore {
    /// Builds a store from draft records, assigning indices and layout positions
    pub fn from_drafts(drafts: Vec<ExhibitDraft>) -> Self {
        let exhibits = drafts
            .into_iter()
            .enumerate()
            .map(|(index, draft)| Exhibit {
                id: draft.id.to_string(),
                title: draft.title.to_string(),
                category: draft.category.to_string(),
                short_description: draft.short_description.to_string(),
                content: draft.content,
                icon: draft.icon.to_string(),
                position: layout_position(index, draft.declared),
                declared: draft.declared,
                index,
            })
            .collect();
        ContentStore { exhibits }
    }

    pub fn builtin() -> Self {
        Self::from_drafts(builtin_drafts())
    }

    pub fn len(&self) -> usize {
        self.exhibits.len()
    }

    pub fn get(&self, index: usize) -> Option<&Exhibit> {
        self.exhibits.get(index)
    }

    pub fn find(&self, id: &str) -> HallResult<&Exhibit> {
        self.exhibits
            .iter()
            .find(|exhibit| exhibit.id == id)
            .ok_or_else(|| HallError::UnknownExhibit(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Exhibit> {
        self.exhibits.iter()
    }
}

/// An exhibit as authored, before layout
#[derive(Debug, Clone)]
pub struct ExhibitDraft {
    pub id: &'static str,
    pub title: &'static str,
    pub category: &'static str,
    pub short_description: &'static str,
    pub icon: &'static str,
    pub declared: Placement,
    pub content: Vec<ContentNode>,
}

fn heading(level: u8, text: &str) -> ContentNode {
    ContentNode::Heading {
        level,
        text: text.to_string(),
    }
}

fn paragraph(text: &str) -> ContentNode {
    ContentNode::Paragraph(text.to_string())
}

fn caption(text: &str) -> ContentNode {
    ContentNode::Caption(text.to_string())
}

fn field(label: &str, value: &str) -> ContentNode {
    ContentNode::Field {
        label: label.to_string(),
        value: value.to_string(),
    }
}

fn list(items: &[&str]) -> ContentNode {
    ContentNode::List(items.iter().map(|item| item.to_string()).collect())
}

fn tags(items: &[&str]) -> ContentNode {
    ContentNode::Tags(items.iter().map(|item| item.to_string()).collect())
}

fn links(items: &[(&str, &str)]) -> ContentNode {
    ContentNode::Links(
        items
            .iter()
            .map(|(label, href)| Link {
                label: label.to_string(),
                href: href.to_string(),
            })
            .collect(),
    )
}

fn section(title: &str, children: Vec<ContentNode>) -> ContentNode {
    ContentNode::Section {
        title: title.to_string(),
        children,
    }
}

fn project(title: &str, stack: &str, summary: &str, first_link: &str) -> ContentNode {
    section(
        title,
        vec![
            caption(stack),
            paragraph(summary),
            links(&[(first_link, "#"), ("GitHub", "#")]),
        ],
    )
}

fn builtin_drafts() -> Vec<ExhibitDraft> {
    vec![
        ExhibitDraft {
            id: "about",
            title: "About Me",
            category: "Personal",
            short_description: "Who I am and what drives me",
            icon: "👤",
            declared: Placement { x: -8.0, z: -8.0 },
            content: vec![
                heading(3, "Welcome to my Portfolio!"),
                paragraph("I'm a passionate developer who loves creating innovative solutions and engaging experiences. This interactive portfolio represents my journey in technology and design."),
                paragraph("Feel free to explore the different exhibits to learn more about my work, skills, and achievements."),
                field("Email", "your.email@example.com"),
                field("Location", "Your City, Country"),
            ],
        },
        ExhibitDraft {
            id: "experience",
            title: "Work Experience",
            category: "Professional",
            short_description: "My professional journey",
            icon: "💼",
            declared: Placement { x: 0.0, z: -8.0 },
            content: vec![
                heading(3, "Professional Experience"),
                paragraph("I've worked on various exciting projects across different technologies and domains."),
                section(
                    "Software Developer",
                    vec![
                        caption("Company Name • 2022 - Present"),
                        list(&[
                            "Developed web applications using modern technologies",
                            "Collaborated with cross-functional teams",
                            "Implemented best practices and coding standards",
                        ]),
                    ],
                ),
                section(
                    "Junior Developer",
                    vec![
                        caption("Previous Company • 2020 - 2022"),
                        list(&[
                            "Built responsive user interfaces",
                            "Optimized application performance",
                            "Participated in code reviews and testing",
                        ]),
                    ],
                ),
            ],
        },
        ExhibitDraft {
            id: "projects",
            title: "Projects",
            category: "Portfolio",
            short_description: "Featured projects and work",
            icon: "🚀",
            declared: Placement { x: 8.0, z: -8.0 },
            content: vec![
                heading(3, "Featured Projects"),
                paragraph("Here are some of my most notable projects:"),
                project(
                    "Interactive Web Application",
                    "React • Node.js • MongoDB",
                    "A full-stack web application with real-time features and modern UI/UX design.",
                    "Live Demo",
                ),
                project(
                    "Mobile App",
                    "React Native • Firebase",
                    "A cross-platform mobile application with offline capabilities and push notifications.",
                    "App Store",
                ),
                project(
                    "3D Visualization Tool",
                    "Three.js • WebGL • GSAP",
                    "An interactive 3D visualization tool for data presentation and analysis.",
                    "Live Demo",
                ),
            ],
        },
        ExhibitDraft {
            id: "skills",
            title: "Skills & Technologies",
            category: "Technical",
            short_description: "Technical skills and expertise",
            icon: "⚡",
            declared: Placement { x: -8.0, z: 0.0 },
            content: vec![
                heading(3, "Technical Skills"),
                section(
                    "Frontend Development",
                    vec![tags(&["HTML5", "CSS3", "JavaScript", "React", "Vue.js", "Three.js"])],
                ),
                section(
                    "Backend Development",
                    vec![tags(&["Node.js", "Python", "Express.js", "MongoDB", "PostgreSQL"])],
                ),
                section(
                    "Tools & Platforms",
                    vec![tags(&["Git", "Docker", "AWS", "Figma", "VS Code"])],
                ),
            ],
        },
        ExhibitDraft {
            id: "education",
            title: "Education",
            category: "Academic",
            short_description: "Educational background",
            icon: "🎓",
            declared: Placement { x: 0.0, z: 0.0 },
            content: vec![
                heading(3, "Educational Background"),
                section(
                    "Bachelor of Computer Science",
                    vec![
                        caption("University Name • 2018 - 2022"),
                        paragraph("Focused on software engineering, algorithms, and web development. Graduated with honors."),
                        list(&[
                            "GPA: 3.8/4.0",
                            "Dean's List: 3 semesters",
                            "Capstone Project: AI-powered recommendation system",
                        ]),
                    ],
                ),
                section(
                    "Certifications",
                    vec![list(&[
                        "AWS Certified Developer Associate",
                        "Google Cloud Professional Developer",
                        "MongoDB Database Administrator",
                    ])],
                ),
            ],
        },
        ExhibitDraft {
            id: "achievements",
            title: "Achievements",
            category: "Recognition",
            short_description: "Awards and recognition",
            icon: "🏆",
            declared: Placement { x: 8.0, z: 0.0 },
            content: vec![
                heading(3, "Achievements & Recognition"),
                section(
                    "🏆 Best Developer Award",
                    vec![
                        caption("2023"),
                        paragraph("Recognized for outstanding contributions to team projects and innovative solutions."),
                    ],
                ),
                section(
                    "🥇 Hackathon Winner",
                    vec![
                        caption("2022"),
                        paragraph("First place in regional hackathon for developing an AI-powered accessibility tool."),
                    ],
                ),
                section(
                    "📈 Performance Excellence",
                    vec![
                        caption("2021"),
                        paragraph("Consistently exceeded performance targets and delivered high-quality solutions."),
                    ],
                ),
            ],
        },
        ExhibitDraft {
            id: "contact",
            title: "Get In Touch",
            category: "Connect",
            short_description: "Let's work together",
            icon: "📞",
            declared: Placement { x: 0.0, z: 8.0 },
            content: vec![
                heading(3, "Let's Connect!"),
                paragraph("I'm always open to discussing new opportunities, collaborations, or just having a chat about technology and innovation."),
                section("📧 Email", vec![paragraph("your.email@example.com")]),
                section(
                    "💼 LinkedIn",
                    vec![links(&[(
                        "linkedin.com/in/yourprofile",
                        "https://linkedin.com/in/yourprofile",
                    )])],
                ),
                section(
                    "🐙 GitHub",
                    vec![links(&[(
                        "github.com/yourusername",
                        "https://github.com/yourusername",
                    )])],
                ),
                section(
                    "📄 Download Resume",
                    vec![
                        paragraph("Get a detailed overview of my experience and skills."),
                        links(&[("Download PDF", "Soham_Resume.pdf")]),
                    ],
                ),
            ],
        },
    ]
}
