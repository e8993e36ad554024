//! The built-in symbol and command tables.

/// The meaning of a built-in control sequence.
pub enum Builtin {
    /// An identifier, rendered as `<mi>`.
    Identifier(&'static str),
    /// An operator, rendered as `<mo>`.
    Operator(&'static str),
    /// A fixed amount of horizontal space, in ems.
    Space(f64),
}

/// Look up a built-in symbol or spacing command.
pub fn get(name: &str) -> Option<Builtin> {
    use Builtin::*;
    Some(match name {
        // Lowercase Greek.
        "alpha" => Identifier("α"),
        "beta" => Identifier("β"),
        "gamma" => Identifier("γ"),
        "delta" => Identifier("δ"),
        "epsilon" => Identifier("ϵ"),
        "varepsilon" => Identifier("ε"),
        "zeta" => Identifier("ζ"),
        "eta" => Identifier("η"),
        "theta" => Identifier("θ"),
        "vartheta" => Identifier("ϑ"),
        "iota" => Identifier("ι"),
        "kappa" => Identifier("κ"),
        "lambda" => Identifier("λ"),
        "mu" => Identifier("μ"),
        "nu" => Identifier("ν"),
        "xi" => Identifier("ξ"),
        "omicron" => Identifier("ο"),
        "pi" => Identifier("π"),
        "varpi" => Identifier("ϖ"),
        "rho" => Identifier("ρ"),
        "varrho" => Identifier("ϱ"),
        "sigma" => Identifier("σ"),
        "varsigma" => Identifier("ς"),
        "tau" => Identifier("τ"),
        "upsilon" => Identifier("υ"),
        "phi" => Identifier("ϕ"),
        "varphi" => Identifier("φ"),
        "chi" => Identifier("χ"),
        "psi" => Identifier("ψ"),
        "omega" => Identifier("ω"),
        // Uppercase Greek.
        "Gamma" => Identifier("Γ"),
        "Delta" => Identifier("Δ"),
        "Theta" => Identifier("Θ"),
        "Lambda" => Identifier("Λ"),
        "Xi" => Identifier("Ξ"),
        "Pi" => Identifier("Π"),
        "Sigma" => Identifier("Σ"),
        "Upsilon" => Identifier("Υ"),
        "Phi" => Identifier("Φ"),
        "Psi" => Identifier("Ψ"),
        "Omega" => Identifier("Ω"),
        // Letter-like.
        "infty" => Identifier("∞"),
        "partial" => Identifier("∂"),
        "nabla" => Identifier("∇"),
        "ell" => Identifier("ℓ"),
        "hbar" => Identifier("ℏ"),
        "imath" => Identifier("ı"),
        "jmath" => Identifier("ȷ"),
        "Re" => Identifier("ℜ"),
        "Im" => Identifier("ℑ"),
        // Named functions, set upright.
        "sin" | "cos" | "tan" | "cot" | "sec" | "csc" | "log" | "ln" | "exp" | "lim" | "max"
        | "min" | "sup" | "inf" | "det" | "gcd" | "deg" | "dim" | "arg" | "mod" => {
            return Some(Identifier(function_name(name)))
        }
        // Binary operators.
        "pm" => Operator("±"),
        "mp" => Operator("∓"),
        "times" => Operator("×"),
        "div" => Operator("÷"),
        "cdot" => Operator("⋅"),
        "ast" => Operator("∗"),
        "star" => Operator("⋆"),
        "circ" => Operator("∘"),
        "bullet" => Operator("∙"),
        "cap" => Operator("∩"),
        "cup" => Operator("∪"),
        "vee" => Operator("∨"),
        "wedge" => Operator("∧"),
        "setminus" => Operator("∖"),
        "oplus" => Operator("⊕"),
        "ominus" => Operator("⊖"),
        "otimes" => Operator("⊗"),
        "oslash" => Operator("⊘"),
        "odot" => Operator("⊙"),
        // Relations.
        "le" | "leq" => Operator("≤"),
        "ge" | "geq" => Operator("≥"),
        "ne" | "neq" => Operator("≠"),
        "sim" => Operator("∼"),
        "simeq" => Operator("≃"),
        "approx" => Operator("≈"),
        "equiv" => Operator("≡"),
        "propto" => Operator("∝"),
        "subset" => Operator("⊂"),
        "supset" => Operator("⊃"),
        "subseteq" => Operator("⊆"),
        "supseteq" => Operator("⊇"),
        "in" => Operator("∈"),
        "ni" => Operator("∋"),
        "notin" => Operator("∉"),
        "mid" => Operator("∣"),
        "parallel" => Operator("∥"),
        "perp" => Operator("⊥"),
        // Arrows.
        "to" | "rightarrow" => Operator("→"),
        "gets" | "leftarrow" => Operator("←"),
        "Rightarrow" => Operator("⇒"),
        "Leftarrow" => Operator("⇐"),
        "leftrightarrow" => Operator("↔"),
        "Leftrightarrow" => Operator("⇔"),
        "mapsto" => Operator("↦"),
        "longrightarrow" => Operator("⟶"),
        "longleftarrow" => Operator("⟵"),
        "uparrow" => Operator("↑"),
        "downarrow" => Operator("↓"),
        // Big operators.
        "sum" => Operator("∑"),
        "prod" => Operator("∏"),
        "int" => Operator("∫"),
        "oint" => Operator("∮"),
        "bigcup" => Operator("⋃"),
        "bigcap" => Operator("⋂"),
        // Dots and punctuation.
        "cdots" => Operator("⋯"),
        "ldots" | "dots" => Operator("…"),
        "vdots" => Operator("⋮"),
        "ddots" => Operator("⋱"),
        "colon" => Operator(":"),
        "vert" | "lvert" | "rvert" => Operator("∣"),
        "Vert" | "lVert" | "rVert" => Operator("∥"),
        "langle" => Operator("⟨"),
        "rangle" => Operator("⟩"),
        "lbrace" => Operator("{"),
        "rbrace" => Operator("}"),
        "backslash" => Operator("\\"),
        // Horizontal spacing. Widths are the standard TeX glue amounts.
        "," | "thinspace" => Space(0.1667),
        ":" | "medspace" => Space(0.2222),
        ";" | "thickspace" => Space(0.2778),
        "!" | "negthinspace" => Space(-0.1667),
        "enspace" => Space(0.5),
        "quad" => Space(1.0),
        "qquad" => Space(2.0),
        _ => return None,
    })
}

fn function_name(name: &str) -> &'static str {
    match name {
        "sin" => "sin",
        "cos" => "cos",
        "tan" => "tan",
        "cot" => "cot",
        "sec" => "sec",
        "csc" => "csc",
        "log" => "log",
        "ln" => "ln",
        "exp" => "exp",
        "lim" => "lim",
        "max" => "max",
        "min" => "min",
        "sup" => "sup",
        "inf" => "inf",
        "det" => "det",
        "gcd" => "gcd",
        "deg" => "deg",
        "dim" => "dim",
        "arg" => "arg",
        "mod" => "mod",
        _ => unreachable!(),
    }
}

/// The control sequences the parser itself gives meaning to.
const COMMANDS: [&str; 11] = [
    "begin",
    "end",
    "relax",
    "text",
    "textcolor",
    "hline",
    "hdashline",
    "env@tag",
    "env@notag",
    "\\",
    " ",
];

/// Tells whether a control sequence name has a built-in meaning. The gullet
/// consults this when diagnosing undefined control sequences inside `\edef`.
pub fn is_builtin(name: &str) -> bool {
    get(name).is_some() || COMMANDS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup() {
        assert!(matches!(get("alpha"), Some(Builtin::Identifier("α"))));
        assert!(matches!(get("pm"), Some(Builtin::Operator("±"))));
        assert!(matches!(get("quad"), Some(Builtin::Space(_))));
        assert!(get("notasymbol").is_none());
    }

    #[test]
    fn commands_are_builtin() {
        assert!(is_builtin("begin"));
        assert!(is_builtin("env@tag"));
        assert!(is_builtin("\\"));
        assert!(!is_builtin("frobnicate"));
    }
}
